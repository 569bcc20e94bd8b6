use thiserror::Error;

/// Result type for dcmindex operations
pub type Result<T> = std::result::Result<T, DcmIndexError>;

/// Error types for dcmindex operations
#[derive(Error, Debug)]
pub enum DcmIndexError {
    /// DICOM reading error
    #[error("DICOM error: {0}")]
    DicomError(String),

    /// Tag not found in DICOM file
    #[error("Tag not found: {0}")]
    TagNotFound(String),

    /// Invalid tag value
    #[error("Invalid tag value: {0}")]
    InvalidValue(String),

    /// A header attribute required to place a file in the hierarchy is absent
    #[error("Missing required attribute: {0}")]
    MissingAttribute(&'static str),

    /// A series was seen under a different study or patient than the one it was created with
    #[error("Inconsistent hierarchy: {0}")]
    InconsistentHierarchy(String),

    /// Lookup by primary key or UID failed
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Malformed filter parameter
    #[error("Invalid filter: {0}")]
    FilterError(String),

    /// Settings or registry snapshot problem
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Unreadable zip archive
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Settings file parse error
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl DcmIndexError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        DcmIndexError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for DcmIndexError {
    fn from(e: dicom_object::ReadError) -> Self {
        DcmIndexError::DicomError(format!("{}", e))
    }
}

impl From<zip::result::ZipError> for DcmIndexError {
    fn from(e: zip::result::ZipError) -> Self {
        DcmIndexError::ArchiveError(format!("{}", e))
    }
}

impl From<dicom_core::value::ConvertValueError> for DcmIndexError {
    fn from(e: dicom_core::value::ConvertValueError) -> Self {
        DcmIndexError::InvalidValue(format!("{}", e))
    }
}
