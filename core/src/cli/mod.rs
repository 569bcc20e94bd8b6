pub mod commands;
pub mod report;

pub use commands::run;

use crate::store::StorageMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for dcmindex
#[derive(Parser, Debug)]
#[command(name = "dcmindex")]
#[command(about = "Index, query and export a local store of MRI DICOM files")]
#[command(version)]
pub struct Cli {
    /// Settings file (TOML); a missing file means defaults
    #[arg(long, env = "DCMINDEX_CONFIG", default_value = "dcmindex.toml", global = true)]
    pub config: PathBuf,

    /// Storage root, overriding the settings file
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the storage root and an empty registry
    Init,

    /// Import DICOM files or directories
    Import {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Only import the <year>/<month>/<day> sub-directory for today
        #[arg(long)]
        today_only: bool,

        /// Header reader threads (0: one per core)
        #[arg(long, value_name = "N")]
        max_parallel: Option<usize>,

        /// How files enter the storage root
        #[arg(long)]
        mode: Option<ModeArg>,
    },

    /// List patients
    Patients,

    /// List studies
    Studies,

    /// List series, optionally filtered
    Series {
        /// Filter as a query string, e.g. "modality=MR&echo_time_max=5"
        #[arg(short, long, value_name = "QS", default_value = "")]
        query: String,
    },

    /// List images
    Images {
        /// Only images of this series (primary key)
        #[arg(long, value_name = "ID")]
        series: Option<u64>,
    },

    /// Report on a single series
    Show {
        #[arg(value_name = "ID")]
        id: u64,
    },

    /// Print the header of an image
    Header {
        #[arg(value_name = "IMAGE-ID")]
        id: u64,

        /// Single element by keyword or "gggg,eeee"
        #[arg(short, long)]
        keyword: Option<String>,

        /// Read the stored file instead of the indexed snapshot
        #[arg(long)]
        raw: bool,
    },

    /// Copy every file of a patient to a directory
    Export {
        #[arg(value_name = "PATIENT-UID")]
        patient: String,

        #[arg(value_name = "DEST")]
        dest: PathBuf,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// Storage mode as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Copy files into the storage root
    Copy,
    /// Move files into the storage root
    Move,
    /// Index files where they are
    InPlace,
}

impl From<ModeArg> for StorageMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Copy => StorageMode::Copy,
            ModeArg::Move => StorageMode::Move,
            ModeArg::InPlace => StorageMode::InPlace,
        }
    }
}
