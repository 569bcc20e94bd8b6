//! Persistence: the registry snapshot and the managed file layout

pub mod registry;
pub mod storage;

pub use registry::{RegisterOutcome, Registry, RegistryCounts, Table, SCHEMA_VERSION};
pub use storage::{default_relative_path, uid_file_name, Storage, StorageMode};
