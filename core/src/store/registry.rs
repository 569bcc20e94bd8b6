//! In-process registry of patients, studies, series and images
//!
//! Rows live in per-kind [`Table`]s keyed by a monotonic id, with a uid
//! index for lookups by DICOM identifier. The whole registry is persisted
//! as one versioned JSON snapshot.

use crate::error::{DcmIndexError, Result};
use crate::models::{DicomEntity, Image, ParsedImage, Patient, Series, Study};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Version of the snapshot layout written by [`Registry::save`]
pub const SCHEMA_VERSION: u32 = 1;

/// Rows of one entity kind
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: BTreeMap<u64, T>,
    by_uid: HashMap<String, u64>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            by_uid: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<T: DicomEntity> Table<T> {
    fn from_rows(rows: Vec<T>) -> Result<Self> {
        let mut table = Self::default();
        for row in rows {
            let id = row.id();
            if id == 0 || table.rows.contains_key(&id) {
                return Err(DcmIndexError::ConfigError(format!(
                    "snapshot holds an invalid or duplicate {} id {}",
                    T::NAME,
                    id
                )));
            }
            if table.by_uid.insert(row.uid().to_string(), id).is_some() {
                return Err(DcmIndexError::ConfigError(format!(
                    "snapshot holds duplicate {} uid {}",
                    T::NAME,
                    row.uid()
                )));
            }
            table.next_id = table.next_id.max(id + 1);
            table.rows.insert(id, row);
        }
        Ok(table)
    }

    /// Assigns the next id and stores the row
    fn insert(&mut self, mut row: T) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        row.set_id(id);
        self.by_uid.insert(row.uid().to_string(), id);
        self.rows.insert(id, row);
        id
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn by_uid(&self, uid: &str) -> Option<&T> {
        self.by_uid.get(uid).and_then(|id| self.rows.get(id))
    }

    pub fn id_of(&self, uid: &str) -> Option<u64> {
        self.by_uid.get(uid).copied()
    }

    /// Rows in id order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn to_rows(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.rows.values().cloned().collect()
    }
}

/// Result of registering one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new image row was created with this id
    Created(u64),
    /// The SOPInstanceUID was already registered under this id
    Existing(u64),
}

impl RegisterOutcome {
    pub fn id(&self) -> u64 {
        match self {
            RegisterOutcome::Created(id) | RegisterOutcome::Existing(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, RegisterOutcome::Created(_))
    }
}

/// Row counts per entity kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCounts {
    pub patients: usize,
    pub studies: usize,
    pub series: usize,
    pub images: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    schema_version: u32,
    patients: Vec<Patient>,
    studies: Vec<Study>,
    series: Vec<Series>,
    images: Vec<Image>,
}

/// The patient / study / series / image hierarchy
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub patients: Table<Patient>,
    pub studies: Table<Study>,
    pub series: Table<Series>,
    pub images: Table<Image>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> RegistryCounts {
        RegistryCounts {
            patients: self.patients.len(),
            studies: self.studies.len(),
            series: self.series.len(),
            images: self.images.len(),
        }
    }

    pub fn get_patient(&self, id: u64) -> Result<&Patient> {
        self.patients
            .get(id)
            .ok_or_else(|| DcmIndexError::not_found(Patient::NAME, id.to_string()))
    }

    pub fn get_study(&self, id: u64) -> Result<&Study> {
        self.studies
            .get(id)
            .ok_or_else(|| DcmIndexError::not_found(Study::NAME, id.to_string()))
    }

    pub fn get_series(&self, id: u64) -> Result<&Series> {
        self.series
            .get(id)
            .ok_or_else(|| DcmIndexError::not_found(Series::NAME, id.to_string()))
    }

    pub fn get_image(&self, id: u64) -> Result<&Image> {
        self.images
            .get(id)
            .ok_or_else(|| DcmIndexError::not_found(Image::NAME, id.to_string()))
    }

    pub fn patient_by_uid(&self, uid: &str) -> Option<&Patient> {
        self.patients.by_uid(uid)
    }

    pub fn study_by_uid(&self, uid: &str) -> Option<&Study> {
        self.studies.by_uid(uid)
    }

    pub fn series_by_uid(&self, uid: &str) -> Option<&Series> {
        self.series.by_uid(uid)
    }

    pub fn image_by_uid(&self, uid: &str) -> Option<&Image> {
        self.images.by_uid(uid)
    }

    /// Verifies that an already registered series keeps its study and patient
    pub fn check_hierarchy(&self, parsed: &ParsedImage) -> Result<()> {
        let Some(existing) = self.series.by_uid(&parsed.series.uid) else {
            return Ok(());
        };
        let same_study = self.studies.id_of(&parsed.study.uid) == Some(existing.study_id);
        let same_patient = self.patients.id_of(&parsed.patient.uid) == Some(existing.patient_id);
        if same_study && same_patient {
            Ok(())
        } else {
            Err(DcmIndexError::InconsistentHierarchy(format!(
                "series {} is registered under another study or patient than image {}",
                parsed.series.uid, parsed.image.uid
            )))
        }
    }

    /// Registers the records parsed from one image header
    ///
    /// Patient, study and series rows are created on first sight and left
    /// untouched afterwards. An image whose SOPInstanceUID is already known
    /// is reported as [`RegisterOutcome::Existing`] and nothing changes.
    ///
    /// # Errors
    ///
    /// [`DcmIndexError::InconsistentHierarchy`] when the series is already
    /// registered under a different study or patient. Nothing is inserted
    /// in that case.
    pub fn register(&mut self, parsed: ParsedImage, path: PathBuf) -> Result<RegisterOutcome> {
        if let Some(id) = self.images.id_of(&parsed.image.uid) {
            debug!("Image {} already registered as #{}", parsed.image.uid, id);
            return Ok(RegisterOutcome::Existing(id));
        }
        self.check_hierarchy(&parsed)?;

        let ParsedImage {
            patient,
            study,
            mut series,
            mut image,
        } = parsed;

        let patient_id = match self.patients.id_of(&patient.uid) {
            Some(id) => id,
            None => {
                let id = self.patients.insert(patient);
                debug!("Created patient #{}", id);
                id
            }
        };
        let study_id = match self.studies.id_of(&study.uid) {
            Some(id) => id,
            None => {
                let id = self.studies.insert(study);
                debug!("Created study #{}", id);
                id
            }
        };
        let series_id = match self.series.id_of(&series.uid) {
            Some(id) => id,
            None => {
                series.study_id = study_id;
                series.patient_id = patient_id;
                let id = self.series.insert(series);
                debug!("Created series #{}", id);
                id
            }
        };

        image.series_id = series_id;
        image.path = path;
        Ok(RegisterOutcome::Created(self.images.insert(image)))
    }

    /// Series of a patient, in id order
    pub fn series_of_patient(&self, patient_id: u64) -> Vec<&Series> {
        self.series
            .iter()
            .filter(|s| s.patient_id == patient_id)
            .collect()
    }

    /// Series of a study, in id order
    pub fn series_of_study(&self, study_id: u64) -> Vec<&Series> {
        self.series
            .iter()
            .filter(|s| s.study_id == study_id)
            .collect()
    }

    /// Studies a patient takes part in, derived through their series
    pub fn studies_of_patient(&self, patient_id: u64) -> Vec<&Study> {
        let ids: BTreeSet<u64> = self
            .series_of_patient(patient_id)
            .iter()
            .map(|s| s.study_id)
            .collect();
        ids.into_iter().filter_map(|id| self.studies.get(id)).collect()
    }

    /// Patients that take part in a study
    pub fn patients_of_study(&self, study_id: u64) -> Vec<&Patient> {
        let ids: BTreeSet<u64> = self
            .series_of_study(study_id)
            .iter()
            .map(|s| s.patient_id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.patients.get(id))
            .collect()
    }

    /// Images of a series, ordered by instance number then id
    pub fn images_of_series(&self, series_id: u64) -> Vec<&Image> {
        let mut images: Vec<&Image> = self
            .images
            .iter()
            .filter(|i| i.series_id == series_id)
            .collect();
        images.sort_by_key(|i| (i.number.is_none(), i.number, i.id));
        images
    }

    /// The first registered image of a series
    pub fn first_image_of_series(&self, series_id: u64) -> Option<&Image> {
        self.images.iter().find(|i| i.series_id == series_id)
    }

    /// File paths of a patient's images, grouped by series uid
    pub fn patient_file_set(&self, uid: &str) -> Result<BTreeMap<String, Vec<PathBuf>>> {
        let patient = self
            .patient_by_uid(uid)
            .ok_or_else(|| DcmIndexError::not_found(Patient::NAME, uid))?;
        Ok(self
            .series_of_patient(patient.id)
            .into_iter()
            .map(|series| {
                let paths = self
                    .images_of_series(series.id)
                    .into_iter()
                    .map(|i| i.path.clone())
                    .collect();
                (series.uid.clone(), paths)
            })
            .collect())
    }

    /// Writes the snapshot atomically (temporary sibling, then rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let snapshot = Snapshot {
            schema_version: SCHEMA_VERSION,
            patients: self.patients.to_rows(),
            studies: self.studies.to_rows(),
            series: self.series.to_rows(),
            images: self.images.to_rows(),
        };
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        fs::rename(&tmp, path)?;
        info!("Saved registry to {}", path.display());
        Ok(())
    }

    /// Loads a snapshot, rejecting unknown schema versions
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let version = value.get("schema_version").and_then(|v| v.as_u64());
        if version != Some(u64::from(SCHEMA_VERSION)) {
            return Err(DcmIndexError::ConfigError(format!(
                "{}: unsupported registry schema version {:?} (expected {})",
                path.display(),
                version,
                SCHEMA_VERSION
            )));
        }
        let snapshot: Snapshot = serde_json::from_value(value)?;
        let registry = Self {
            patients: Table::from_rows(snapshot.patients)?,
            studies: Table::from_rows(snapshot.studies)?,
            series: Table::from_rows(snapshot.series)?,
            images: Table::from_rows(snapshot.images)?,
        };
        debug!("Loaded registry {:?} from {}", registry.counts(), path.display());
        Ok(registry)
    }

    /// Loads the snapshot, or starts empty when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
