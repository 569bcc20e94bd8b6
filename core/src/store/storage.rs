//! Managed file layout under the storage root
//!
//! Imported files are organised as
//! `MRI/<PatientID>/<SeriesInstanceUID>/DICOM/<InstanceNumber>.dcm`.

use crate::error::Result;
use crate::models::{Image, ParsedImage};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Top-level directory of managed MR files
pub const MRI_DIR: &str = "MRI";

/// Directory holding the DICOM files of a series
pub const DICOM_DIR: &str = "DICOM";

/// How imported files reach the storage root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageMode {
    /// Copy into the managed layout, leaving the source untouched
    #[default]
    Copy,
    /// Move into the managed layout
    Move,
    /// Leave files where they are and record their absolute path
    InPlace,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Copy => write!(f, "copy"),
            StorageMode::Move => write!(f, "move"),
            StorageMode::InPlace => write!(f, "in-place"),
        }
    }
}

/// Replaces characters that are unsafe in a path component
fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Relative managed path of an image
pub fn default_relative_path(patient_uid: &str, series_uid: &str, image: &Image) -> PathBuf {
    PathBuf::from(MRI_DIR)
        .join(sanitize_component(patient_uid))
        .join(sanitize_component(series_uid))
        .join(DICOM_DIR)
        .join(format!("{}.dcm", sanitize_component(&image.file_stem())))
}

/// File name used when the instance-number name of an image is taken
pub fn uid_file_name(image: &Image) -> String {
    format!("{}.dcm", sanitize_component(&image.uid))
}

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    mode: StorageMode,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>, mode: StorageMode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Absolute location of a stored path
    pub fn resolve(&self, stored: &Path) -> PathBuf {
        if stored.is_absolute() {
            stored.to_path_buf()
        } else {
            self.root.join(stored)
        }
    }

    /// Places `source` according to the storage mode
    ///
    /// Returns the path to record for the image: relative to the root for
    /// managed modes, the absolute source path for [`StorageMode::InPlace`].
    /// When two images of a series share an instance number the second one
    /// is named after its SOPInstanceUID. Existing files are never
    /// overwritten: if that name is taken too the placement fails and the
    /// source is left untouched.
    pub fn place(&self, source: &Path, parsed: &ParsedImage) -> Result<PathBuf> {
        if self.mode == StorageMode::InPlace {
            return Ok(fs::canonicalize(source)?);
        }

        let mut relative = default_relative_path(&parsed.patient.uid, &parsed.series.uid, &parsed.image);
        if self.root.join(&relative).exists() {
            relative.set_file_name(uid_file_name(&parsed.image));
        }
        let dest = self.root.join(&relative);
        if dest.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is already taken", dest.display()),
            )
            .into());
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        match self.mode {
            StorageMode::Move => match fs::rename(source, &dest) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                    fs::copy(source, &dest)?;
                    fs::remove_file(source)?;
                }
                Err(e) => return Err(e.into()),
            },
            _ => {
                fs::copy(source, &dest)?;
            }
        }
        debug!("{} {} -> {}", self.mode, source.display(), dest.display());
        Ok(relative)
    }

    /// Copies the stored file of `image` to `dest`, creating parent directories
    pub fn create_backup(&self, image: &Image, dest: &Path) -> Result<PathBuf> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(self.resolve(&image.path), dest)?;
        Ok(dest.to_path_buf())
    }
}
