use chrono::{NaiveDate, NaiveTime};
use dicom_core::Tag;
use dicom_object::InMemDicomObject;

use super::dates::{parse_da, parse_tm};

// Core Image Tags
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

// Image Geometry Tags
pub const PIXEL_SPACING: Tag = Tag(0x0028, 0x0030);
pub const SLICE_THICKNESS: Tag = Tag(0x0018, 0x0050);

// Patient Tags
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
pub const PATIENT_POSITION: Tag = Tag(0x0018, 0x5100);

// Study Tags
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);

// Series Tags
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);
pub const SERIES_DATE: Tag = Tag(0x0008, 0x0021);
pub const SERIES_TIME: Tag = Tag(0x0008, 0x0031);
pub const PROTOCOL_NAME: Tag = Tag(0x0018, 0x1030);
pub const BODY_PART_EXAMINED: Tag = Tag(0x0018, 0x0015);
pub const OPERATORS_NAME: Tag = Tag(0x0008, 0x1070);

// MR Acquisition Tags
pub const SCANNING_SEQUENCE: Tag = Tag(0x0018, 0x0020);
pub const SEQUENCE_VARIANT: Tag = Tag(0x0018, 0x0021);
pub const MR_ACQUISITION_TYPE: Tag = Tag(0x0018, 0x0023);
pub const SEQUENCE_NAME: Tag = Tag(0x0018, 0x0024);
pub const REPETITION_TIME: Tag = Tag(0x0018, 0x0080);
pub const ECHO_TIME: Tag = Tag(0x0018, 0x0081);
pub const INVERSION_TIME: Tag = Tag(0x0018, 0x0082);
pub const MAGNETIC_FIELD_STRENGTH: Tag = Tag(0x0018, 0x0087);
pub const FLIP_ANGLE: Tag = Tag(0x0018, 0x1314);
pub const PULSE_SEQUENCE_NAME: Tag = Tag(0x0018, 0x9005);

// Device/Manufacturer Tags
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
pub const MANUFACTURER_MODEL_NAME: Tag = Tag(0x0008, 0x1090);
pub const DEVICE_SERIAL_NUMBER: Tag = Tag(0x0018, 0x1000);
pub const INSTITUTION_NAME: Tag = Tag(0x0008, 0x0080);

// Instance Tags
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
pub const INSTANCE_CREATION_DATE: Tag = Tag(0x0008, 0x0012);
pub const INSTANCE_CREATION_TIME: Tag = Tag(0x0008, 0x0013);

// Siemens private (CSA) Tags
pub const SIEMENS_B_VALUE: Tag = Tag(0x0019, 0x100C);
pub const SIEMENS_GRADIENT_DIRECTION: Tag = Tag(0x0019, 0x100E);
pub const SIEMENS_SLICE_TIMING: Tag = Tag(0x0019, 0x1029);
pub const SIEMENS_PULSE_SEQUENCE_NAME: Tag = Tag(0x0019, 0x109C);

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present, cannot be converted to string,
/// or holds only padding
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().trim_end_matches('\0').to_string())
        .filter(|s| !s.is_empty())
}

/// Helper to get integer value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to i32
pub fn get_int_value(dcm: &InMemDicomObject, tag: Tag) -> Option<i32> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<i32>().ok())
}

/// Helper to get a floating point value from DICOM tag
///
/// Non-finite values ("NaN", "inf") are treated as absent.
pub fn get_float_value(dcm: &InMemDicomObject, tag: Tag) -> Option<f64> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_float64().ok())
        .filter(|v| v.is_finite())
}

/// Helper to get all floating point values of a multi-valued tag
pub fn get_multi_float_value(dcm: &InMemDicomObject, tag: Tag) -> Option<Vec<f64>> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_multi_float64().ok())
        .filter(|values| !values.is_empty() && values.iter().all(|v| v.is_finite()))
}

/// Helper to get multi-string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to Vec<String>
pub fn get_multi_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<Vec<String>> {
    dcm.element(tag).ok().and_then(|elem| {
        // Try to get as multi-string
        if let Ok(strs) = elem.to_multi_str() {
            Some(strs.iter().map(|s| s.trim().to_string()).collect())
        } else {
            // Fallback: try to get as single string and split by backslash
            elem.to_str()
                .ok()
                .map(|s| s.split('\\').map(|part| part.trim().to_string()).collect())
        }
    })
}

/// Helper to get a DA value as a calendar date
pub fn get_date_value(dcm: &InMemDicomObject, tag: Tag) -> Option<NaiveDate> {
    get_string_value(dcm, tag).and_then(|s| parse_da(&s))
}

/// Helper to get a TM value as a time of day
pub fn get_time_value(dcm: &InMemDicomObject, tag: Tag) -> Option<NaiveTime> {
    get_string_value(dcm, tag).and_then(|s| parse_tm(&s))
}

/// Helper to get the raw bytes of an element
pub fn get_bytes_value(dcm: &InMemDicomObject, tag: Tag) -> Option<Vec<u8>> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_bytes().ok())
        .map(|bytes| bytes.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{DataElement, PrimitiveValue, VR};

    #[test]
    fn test_tag_values() {
        // Just ensure tags are correctly defined
        assert_eq!(IMAGE_TYPE, Tag(0x0008, 0x0008));
        assert_eq!(MODALITY, Tag(0x0008, 0x0060));
        assert_eq!(SERIES_INSTANCE_UID, Tag(0x0020, 0x000E));
        assert_eq!(SOP_INSTANCE_UID, Tag(0x0008, 0x0018));
        assert_eq!(SIEMENS_B_VALUE, Tag(0x0019, 0x100C));
    }

    #[test]
    fn test_string_helpers() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            SERIES_DESCRIPTION,
            VR::LO,
            PrimitiveValue::from("MPRAGE "),
        ));
        dcm.put(DataElement::new(PROTOCOL_NAME, VR::LO, PrimitiveValue::from(" ")));
        assert_eq!(
            get_string_value(&dcm, SERIES_DESCRIPTION).as_deref(),
            Some("MPRAGE")
        );
        assert_eq!(get_string_value(&dcm, PROTOCOL_NAME), None);
        assert_eq!(get_string_value(&dcm, STUDY_DESCRIPTION), None);
    }

    #[test]
    fn test_numeric_helpers() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(ECHO_TIME, VR::DS, PrimitiveValue::from("2.98")));
        dcm.put(DataElement::new(SERIES_NUMBER, VR::IS, PrimitiveValue::from("7")));
        dcm.put(DataElement::new(
            PIXEL_SPACING,
            VR::DS,
            PrimitiveValue::Strs(vec!["0.5".to_string(), "0.75".to_string()].into()),
        ));
        assert_eq!(get_float_value(&dcm, ECHO_TIME), Some(2.98));
        assert_eq!(get_int_value(&dcm, SERIES_NUMBER), Some(7));
        assert_eq!(
            get_multi_float_value(&dcm, PIXEL_SPACING),
            Some(vec![0.5, 0.75])
        );
    }

    #[test]
    fn test_non_finite_floats_are_absent() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(ECHO_TIME, VR::DS, PrimitiveValue::from("NaN")));
        dcm.put(DataElement::new(
            PIXEL_SPACING,
            VR::DS,
            PrimitiveValue::Strs(vec!["inf".to_string(), "0.75".to_string()].into()),
        ));
        assert_eq!(get_float_value(&dcm, ECHO_TIME), None);
        assert_eq!(get_multi_float_value(&dcm, PIXEL_SPACING), None);
    }

    #[test]
    fn test_date_time_helpers() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(STUDY_DATE, VR::DA, PrimitiveValue::from("20200114")));
        dcm.put(DataElement::new(STUDY_TIME, VR::TM, PrimitiveValue::from("073412.5")));
        assert_eq!(
            get_date_value(&dcm, STUDY_DATE),
            NaiveDate::from_ymd_opt(2020, 1, 14)
        );
        assert_eq!(
            get_time_value(&dcm, STUDY_TIME),
            NaiveTime::from_hms_milli_opt(7, 34, 12, 500)
        );
    }
}
