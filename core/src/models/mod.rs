//! Patient / Study / Series / Image records
//!
//! Each record is created from the header of the first image that names it.
//! Relations are held as registry ids (`study_id`, `patient_id`,
//! `series_id`) and resolved through [`crate::store::Registry`].

mod image;
mod patient;
mod series;
mod study;

pub use image::{is_valid_uid, Image};
pub use patient::Patient;
pub use series::Series;
pub use study::Study;

use crate::error::Result;
use crate::header::Header;
use std::path::Path;

/// Behaviour shared by the four record kinds
pub trait DicomEntity {
    /// Lowercase entity name, used in URLs and messages
    const NAME: &'static str;

    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);

    /// Unique DICOM identifier
    fn uid(&self) -> &str;

    /// Fills the header-derived fields from `header`
    fn update_fields_from_header(&mut self, header: &Header);
}

/// The four records described by one image header, before registration
#[derive(Debug, Clone)]
pub struct ParsedImage {
    pub patient: Patient,
    pub study: Study,
    pub series: Series,
    pub image: Image,
}

impl ParsedImage {
    /// Builds all records from one header
    ///
    /// # Errors
    ///
    /// Fails when any of PatientID, StudyInstanceUID, SeriesInstanceUID or
    /// SOPInstanceUID is missing, or the SOPInstanceUID is malformed.
    pub fn from_header(header: &Header, path: &Path) -> Result<Self> {
        Ok(Self {
            patient: Patient::from_header(header)?,
            study: Study::from_header(header)?,
            series: Series::from_header(header)?,
            image: Image::from_header(header, path)?,
        })
    }

    /// Reads the file header and builds the records
    pub fn from_file(path: &Path) -> Result<Self> {
        let header = Header::open(path)?;
        Self::from_header(&header, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::tests::mr_object;
    use crate::error::DcmIndexError;
    use crate::extraction::PATIENT_ID;

    #[test]
    fn test_parsed_image_from_header() {
        let header = Header::from_object(mr_object("P1", "1.2.3", "1.2.3.4", "1.2.3.4.5"));
        let parsed = ParsedImage::from_header(&header, Path::new("/data/a.dcm")).unwrap();
        assert_eq!(parsed.patient.uid(), "P1");
        assert_eq!(parsed.study.uid(), "1.2.3");
        assert_eq!(parsed.series.uid(), "1.2.3.4");
        assert_eq!(parsed.image.uid(), "1.2.3.4.5");
        assert_eq!(Patient::NAME, "patient");
        assert_eq!(Image::NAME, "image");
    }

    #[test]
    fn test_parsed_image_requires_patient_id() {
        let mut dcm = mr_object("P1", "1.2.3", "1.2.3.4", "1.2.3.4.5");
        dcm.remove_element(PATIENT_ID);
        let header = Header::from_object(dcm);
        let err = ParsedImage::from_header(&header, Path::new("a.dcm")).unwrap_err();
        assert!(matches!(err, DcmIndexError::MissingAttribute("PatientID")));
    }
}
