//! Siemens private (0019,xxxx) diffusion and timing attributes
//!
//! Depending on how the file was written these arrive either with their
//! real VR (IS / FD) or as opaque bytes (UN / OB), in which case they hold
//! little-endian doubles or a padded integer string.

use dicom_core::{Tag, VR};
use dicom_object::InMemDicomObject;

use super::tags::{
    SIEMENS_B_VALUE, SIEMENS_GRADIENT_DIRECTION, SIEMENS_PULSE_SEQUENCE_NAME, SIEMENS_SLICE_TIMING,
};

/// Decimal places kept for slice timing values
const SLICE_TIMING_DECIMALS: i32 = 5;

fn is_opaque(vr: VR) -> bool {
    matches!(vr, VR::UN | VR::OB | VR::OW)
}

/// Decodes a byte buffer as consecutive little-endian f64 values
///
/// Trailing bytes that do not fill a full value are ignored.
pub fn decode_f64_array(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn get_float_array(dcm: &InMemDicomObject, tag: Tag) -> Option<Vec<f64>> {
    let elem = dcm.element(tag).ok()?;
    let values = if is_opaque(elem.vr()) {
        decode_f64_array(&elem.to_bytes().ok()?)
    } else {
        elem.to_multi_float64().ok()?
    };
    (!values.is_empty() && values.iter().all(|v| v.is_finite())).then_some(values)
}

fn opaque_text(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    (!text.is_empty()).then(|| text.to_string())
}

/// Diffusion b-value (0019,100C)
pub fn extract_b_value(dcm: &InMemDicomObject) -> Option<i32> {
    let elem = dcm.element(SIEMENS_B_VALUE).ok()?;
    if is_opaque(elem.vr()) {
        opaque_text(&elem.to_bytes().ok()?)?.parse().ok()
    } else {
        elem.to_int::<i32>().ok()
    }
}

/// Diffusion gradient direction (0019,100E)
pub fn extract_gradient_direction(dcm: &InMemDicomObject) -> Option<Vec<f64>> {
    get_float_array(dcm, SIEMENS_GRADIENT_DIRECTION)
}

/// Slice acquisition times in milliseconds (0019,1029), rounded to 5 decimals
pub fn extract_slice_timing(dcm: &InMemDicomObject) -> Option<Vec<f64>> {
    get_float_array(dcm, SIEMENS_SLICE_TIMING).map(|values| {
        values
            .into_iter()
            .map(|v| round_to(v, SLICE_TIMING_DECIMALS))
            .collect()
    })
}

/// Siemens pulse sequence name (0019,109C)
pub fn extract_pulse_sequence_name(dcm: &InMemDicomObject) -> Option<String> {
    let elem = dcm.element(SIEMENS_PULSE_SEQUENCE_NAME).ok()?;
    if is_opaque(elem.vr()) {
        opaque_text(&elem.to_bytes().ok()?)
    } else {
        let text = elem.to_str().ok()?;
        let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{DataElement, PrimitiveValue};

    fn f64_bytes(values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_f64_array() {
        let bytes = f64_bytes(&[1.0, -0.5, 0.25]);
        assert_eq!(decode_f64_array(&bytes), vec![1.0, -0.5, 0.25]);
        assert!(decode_f64_array(&bytes[..7]).is_empty());
    }

    #[test]
    fn test_slice_timing_from_bytes_is_rounded() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            SIEMENS_SLICE_TIMING,
            VR::UN,
            PrimitiveValue::from(f64_bytes(&[0.0, 512.499999999, 1025.123456789])),
        ));
        assert_eq!(
            extract_slice_timing(&dcm),
            Some(vec![0.0, 512.5, 1025.12346])
        );
    }

    #[test]
    fn test_gradient_direction_from_fd() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            SIEMENS_GRADIENT_DIRECTION,
            VR::FD,
            PrimitiveValue::F64(vec![0.0, 0.6, -0.8].into()),
        ));
        assert_eq!(extract_gradient_direction(&dcm), Some(vec![0.0, 0.6, -0.8]));
    }

    #[test]
    fn test_b_value_variants() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(SIEMENS_B_VALUE, VR::IS, PrimitiveValue::from("1000")));
        assert_eq!(extract_b_value(&dcm), Some(1000));

        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            SIEMENS_B_VALUE,
            VR::UN,
            PrimitiveValue::from(b"700 ".to_vec()),
        ));
        assert_eq!(extract_b_value(&dcm), Some(700));

        assert_eq!(extract_b_value(&InMemDicomObject::new_empty()), None);
    }

    #[test]
    fn test_pulse_sequence_name_from_bytes() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            SIEMENS_PULSE_SEQUENCE_NAME,
            VR::UN,
            PrimitiveValue::from(b"tfl3d1_16ns\0".to_vec()),
        ));
        assert_eq!(
            extract_pulse_sequence_name(&dcm).as_deref(),
            Some("tfl3d1_16ns")
        );
    }
}
