use crate::types::PersonName;
use dicom_object::InMemDicomObject;

use super::tags::{get_string_value, PATIENT_NAME};

/// Parses a PN value into its components
///
/// Only the alphabetic component group (before the first `=`) is used.
/// Components are ordered family, given, middle, prefix, suffix.
pub fn parse_person_name(value: &str) -> PersonName {
    let alphabetic = value.split('=').next().unwrap_or_default();
    let mut parts = alphabetic.split('^').map(|p| {
        let p = p.trim();
        (!p.is_empty()).then(|| p.to_string())
    });

    PersonName {
        family_name: parts.next().flatten(),
        given_name: parts.next().flatten(),
        middle_name: parts.next().flatten(),
        name_prefix: parts.next().flatten(),
        name_suffix: parts.next().flatten(),
    }
}

/// Extracts the patient's name from a DICOM header
pub fn extract_patient_name(dcm: &InMemDicomObject) -> PersonName {
    get_string_value(dcm, PATIENT_NAME)
        .map(|s| parse_person_name(&s))
        .unwrap_or_default()
}
