pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod filters;
pub mod header;
pub mod import;
pub mod models;
pub mod server;
pub mod store;
pub mod types;

pub use cli::report::TextReport;
pub use config::Settings;
pub use error::{DcmIndexError, Result};
pub use filters::{FilterSet, ImageFilter, PatientFilter, QueryParams, SeriesFilter, StudyFilter};
pub use header::{Header, HeaderValue};
pub use import::{import_paths, ImportOptions, ImportSummary};
pub use models::{DicomEntity, Image, ParsedImage, Patient, Series, Study};
pub use store::{Registry, Storage, StorageMode};
pub use types::*;
