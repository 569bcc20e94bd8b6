use super::DicomEntity;
use crate::error::{DcmIndexError, Result};
use crate::extraction::{extract_patient_name, get_date_value, get_string_value};
use crate::extraction::{PATIENT_BIRTH_DATE, PATIENT_ID, PATIENT_SEX};
use crate::header::Header;
use crate::types::{PersonName, Sex};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A patient, identified by PatientID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: u64,

    /// PatientID
    pub uid: String,

    pub date_of_birth: Option<NaiveDate>,

    pub sex: Option<Sex>,

    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub middle_name: Option<String>,
    pub name_prefix: Option<String>,
    pub name_suffix: Option<String>,
}

impl Patient {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    /// Creates an unregistered patient from an image header
    pub fn from_header(header: &Header) -> Result<Self> {
        let uid = get_string_value(header.object(), PATIENT_ID)
            .ok_or(DcmIndexError::MissingAttribute("PatientID"))?;
        let mut patient = Self::new(uid);
        patient.update_fields_from_header(header);
        Ok(patient)
    }

    /// Name components as a [`PersonName`]
    pub fn name(&self) -> PersonName {
        PersonName {
            family_name: self.family_name.clone(),
            given_name: self.given_name.clone(),
            middle_name: self.middle_name.clone(),
            name_prefix: self.name_prefix.clone(),
            name_suffix: self.name_suffix.clone(),
        }
    }

    /// "<given> <family>", trimmed
    pub fn full_name(&self) -> String {
        self.name().full_name()
    }

    fn set_name(&mut self, name: PersonName) {
        self.family_name = name.family_name;
        self.given_name = name.given_name;
        self.middle_name = name.middle_name;
        self.name_prefix = name.name_prefix;
        self.name_suffix = name.name_suffix;
    }
}

impl DicomEntity for Patient {
    const NAME: &'static str = "patient";

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
        self.date_of_birth = get_date_value(dcm, PATIENT_BIRTH_DATE);
        self.sex = get_string_value(dcm, PATIENT_SEX).and_then(|s| Sex::from_code(&s));
        self.set_name(extract_patient_name(dcm));
    }
}
