use super::DicomEntity;
use crate::error::{DcmIndexError, Result};
use crate::extraction::tags::{
    get_date_value, get_int_value, get_string_value, get_time_value, INSTANCE_CREATION_DATE,
    INSTANCE_CREATION_TIME, INSTANCE_NUMBER, SOP_INSTANCE_UID,
};
use crate::extraction::{extract_b_value, extract_gradient_direction, extract_slice_timing};
use crate::header::{Header, HeaderSnapshot};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum length of a DICOM UID
const MAX_UID_LENGTH: usize = 64;

/// Checks the UI value constraints: digits and dots, at most 64 characters
pub fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty()
        && uid.len() <= MAX_UID_LENGTH
        && uid.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// A single DICOM file, identified by SOPInstanceUID
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u64,
    pub uid: String,
    pub number: Option<i32>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,

    /// File location, relative to the storage root when managed
    pub path: PathBuf,

    pub created_at: DateTime<Utc>,

    /// Diffusion b-value (Siemens)
    pub b_value: Option<i32>,

    /// Diffusion gradient direction (Siemens)
    pub gradient_direction: Option<Vec<f64>>,

    /// Slice acquisition times in milliseconds (Siemens)
    pub slice_timing: Option<Vec<f64>>,

    /// Public header elements keyed by keyword
    #[serde(default)]
    pub header: HeaderSnapshot,

    pub series_id: u64,
}

impl Image {
    pub fn new(uid: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: 0,
            uid: uid.into(),
            number: None,
            date: None,
            time: None,
            path: path.into(),
            created_at: Utc::now(),
            b_value: None,
            gradient_direction: None,
            slice_timing: None,
            header: HeaderSnapshot::new(),
            series_id: 0,
        }
    }

    pub fn from_header(header: &Header, path: &Path) -> Result<Self> {
        let uid = get_string_value(header.object(), SOP_INSTANCE_UID)
            .ok_or(DcmIndexError::MissingAttribute("SOPInstanceUID"))?;
        if !is_valid_uid(&uid) {
            return Err(DcmIndexError::InvalidValue(format!(
                "SOPInstanceUID '{}' is not a valid UID",
                uid
            )));
        }
        let mut image = Self::new(uid, path);
        image.update_fields_from_header(header);
        Ok(image)
    }

    /// Instance number as text, falling back to the UID
    pub fn file_stem(&self) -> String {
        self.number
            .map(|n| n.to_string())
            .unwrap_or_else(|| self.uid.clone())
    }
}

impl DicomEntity for Image {
    const NAME: &'static str = "image";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn uid(&self) -> &str {
        &self.uid
    }

    fn update_fields_from_header(&mut self, header: &Header) {
        let dcm = header.object();
        self.number = get_int_value(dcm, INSTANCE_NUMBER);
        self.date = get_date_value(dcm, INSTANCE_CREATION_DATE);
        self.time = get_time_value(dcm, INSTANCE_CREATION_TIME);
        self.b_value = extract_b_value(dcm);
        self.gradient_direction = extract_gradient_direction(dcm);
        self.slice_timing = extract_slice_timing(dcm);
        self.header = header.snapshot();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::tests::mr_object;
    use crate::header::HeaderValue;
    use rstest::rstest;

    #[rstest]
    #[case("1.2.840.10008.5.1.4.1.1.4", true)]
    #[case("1.2.abc", false)]
    #[case("", false)]
    fn test_is_valid_uid(#[case] uid: &str, #[case] expected: bool) {
        assert_eq!(is_valid_uid(uid), expected);
    }

    #[test]
    fn test_uid_length_limit() {
        assert!(is_valid_uid(&"1".repeat(64)));
        assert!(!is_valid_uid(&"1".repeat(65)));
    }

    #[test]
    fn test_from_header() {
        let header = Header::from_object(mr_object("P1", "1.2", "1.2.3", "1.2.3.4"));
        let image = Image::from_header(&header, Path::new("/data/1.dcm")).unwrap();
        assert_eq!(image.uid, "1.2.3.4");
        assert_eq!(image.number, Some(1));
        assert_eq!(image.path, PathBuf::from("/data/1.dcm"));
        assert_eq!(
            image.header.get("PatientID"),
            Some(&HeaderValue::Text("P1".to_string()))
        );
        assert_eq!(image.file_stem(), "1");
    }

    #[test]
    fn test_invalid_uid_rejected() {
        let header = Header::from_object(mr_object("P1", "1.2", "1.2.3", "not-a-uid"));
        assert!(matches!(
            Image::from_header(&header, Path::new("a.dcm")),
            Err(DcmIndexError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_file_stem_without_number() {
        let image = Image::new("1.2.3.4", "a.dcm");
        assert_eq!(image.file_stem(), "1.2.3.4");
    }
}
