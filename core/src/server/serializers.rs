//! JSON representations of registry rows
//!
//! Enumerations are rendered by their DICOM codes, dates as ISO-8601 and
//! related rows by primary key. Image headers are only served by the
//! dedicated header endpoint.

use crate::header::snapshot_to_json;
use crate::models::{Image, Patient, Series, Study};
use crate::store::Registry;
use serde_json::{json, Value};

pub fn patient(patient: &Patient) -> Value {
    json!({
        "id": patient.id,
        "uid": patient.uid,
        "date_of_birth": patient.date_of_birth,
        "sex": patient.sex.map(|s| s.code()),
        "given_name": patient.given_name,
        "family_name": patient.family_name,
        "middle_name": patient.middle_name,
        "name_prefix": patient.name_prefix,
        "name_suffix": patient.name_suffix,
        "full_name": patient.full_name(),
    })
}

pub fn study(study: &Study) -> Value {
    json!({
        "id": study.id,
        "uid": study.uid,
        "description": study.description,
        "date": study.date,
        "time": study.time,
    })
}

pub fn series(series: &Series) -> Value {
    json!({
        "id": series.id,
        "uid": series.uid,
        "number": series.number,
        "description": series.description,
        "date": series.date,
        "time": series.time,
        "modality": series.modality.map(|m| m.code()),
        "protocol_name": series.protocol_name,
        "scanning_sequence": series.scanning_sequence_codes(),
        "sequence_variant": series.sequence_variant_codes(),
        "pulse_sequence_name": series.pulse_sequence_name,
        "sequence_name": series.sequence_name,
        "echo_time": series.echo_time,
        "inversion_time": series.inversion_time,
        "repetition_time": series.repetition_time,
        "flip_angle": series.flip_angle,
        "pixel_spacing": series.pixel_spacing.map(|p| [p.row, p.col]),
        "slice_thickness": series.slice_thickness,
        "manufacturer": series.manufacturer,
        "manufacturer_model_name": series.manufacturer_model_name,
        "device_serial_number": series.device_serial_number,
        "institution_name": series.institution_name,
        "magnetic_field_strength": series.magnetic_field_strength,
        "body_part_examined": series.body_part_examined,
        "patient_position": series.patient_position,
        "mr_acquisition_type": series.mr_acquisition_type,
        "operator_name": series.operator_name,
        "sequence_type": series.sequence_type.map(|t| t.key()),
        "sequence_type_label": series.sequence_type_label(),
        "study": series.study_id,
        "patient": series.patient_id,
    })
}

pub fn image(image: &Image) -> Value {
    json!({
        "id": image.id,
        "uid": image.uid,
        "number": image.number,
        "date": image.date,
        "time": image.time,
        "path": image.path,
        "created_at": image.created_at,
        "b_value": image.b_value,
        "gradient_direction": image.gradient_direction,
        "slice_timing": image.slice_timing,
        "series": image.series_id,
    })
}

/// Image detail with its parent uids resolved
pub fn image_detail(registry: &Registry, image: &Image) -> Value {
    let mut value = self::image(image);
    let series = registry.series.get(image.series_id);
    if let Value::Object(map) = &mut value {
        map.insert("series_uid".into(), json!(series.map(|s| s.uid.as_str())));
        map.insert(
            "study_uid".into(),
            json!(series
                .and_then(|s| registry.studies.get(s.study_id))
                .map(|s| s.uid.as_str())),
        );
        map.insert(
            "patient_uid".into(),
            json!(series
                .and_then(|s| registry.patients.get(s.patient_id))
                .map(|p| p.uid.as_str())),
        );
    }
    value
}

pub fn image_header(image: &Image) -> Value {
    json!({
        "id": image.id,
        "uid": image.uid,
        "header": snapshot_to_json(&image.header),
    })
}
