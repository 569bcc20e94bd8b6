use super::DicomEntity;
use crate::error::{DcmIndexError, Result};
use crate::extraction::tags::*;
use crate::extraction::{
    detect_sequence_type, extract_pulse_sequence_name, SequenceSignature,
};
use crate::header::Header;
use crate::types::{Modality, PixelSpacing, ScanningSequence, SequenceType, SequenceVariant};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A series, identified by SeriesInstanceUID
///
/// Holds the acquisition parameters shared by all of its images. The
/// sequence type is detected once, from the header of the first image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: u64,
    pub uid: String,
    pub number: Option<i32>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub modality: Option<Modality>,
    pub protocol_name: Option<String>,

    /// At most [`ScanningSequence::MAX_VALUES`] entries
    pub scanning_sequence: Vec<ScanningSequence>,

    /// At most [`SequenceVariant::MAX_VALUES`] entries
    pub sequence_variant: Vec<SequenceVariant>,

    pub pulse_sequence_name: Option<String>,
    pub sequence_name: Option<String>,

    /// Milliseconds
    pub echo_time: Option<f64>,
    pub inversion_time: Option<f64>,
    pub repetition_time: Option<f64>,

    /// Degrees
    pub flip_angle: Option<f64>,

    pub pixel_spacing: Option<PixelSpacing>,
    pub slice_thickness: Option<f64>,

    pub manufacturer: Option<String>,
    pub manufacturer_model_name: Option<String>,
    pub device_serial_number: Option<String>,
    pub institution_name: Option<String>,

    /// Tesla
    pub magnetic_field_strength: Option<f64>,

    pub body_part_examined: Option<String>,
    pub patient_position: Option<String>,
    pub mr_acquisition_type: Option<String>,
    pub operator_name: Option<String>,

    /// `None` when the sequence type is unknown
    pub sequence_type: Option<SequenceType>,

    pub study_id: u64,
    pub patient_id: u64,
}

impl Series {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn from_header(header: &Header) -> Result<Self> {
        let uid = get_string_value(header.object(), SERIES_INSTANCE_UID)
            .ok_or(DcmIndexError::MissingAttribute("SeriesInstanceUID"))?;
        let mut series = Self::new(uid);
        series.update_fields_from_header(header);
        Ok(series)
    }

    pub fn scanning_sequence_codes(&self) -> Vec<&'static str> {
        self.scanning_sequence.iter().map(|s| s.code()).collect()
    }

    pub fn sequence_variant_codes(&self) -> Vec<&'static str> {
        self.sequence_variant.iter().map(|s| s.code()).collect()
    }

    /// Display label of the detected sequence type
    pub fn sequence_type_label(&self) -> &'static str {
        self.sequence_type.map_or("Unknown", |t| t.label())
    }
}

impl DicomEntity for Series {
    const NAME: &'static str = "series";

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
        let signature = SequenceSignature::from_dicom(dcm);

        self.number = get_int_value(dcm, SERIES_NUMBER);
        self.description = get_string_value(dcm, SERIES_DESCRIPTION);
        self.date = get_date_value(dcm, SERIES_DATE);
        self.time = get_time_value(dcm, SERIES_TIME);
        self.modality = signature.modality;
        self.protocol_name = get_string_value(dcm, PROTOCOL_NAME);
        self.scanning_sequence = signature
            .scanning_sequence
            .iter()
            .copied()
            .take(ScanningSequence::MAX_VALUES)
            .collect();
        self.sequence_variant = signature
            .sequence_variant
            .iter()
            .copied()
            .take(SequenceVariant::MAX_VALUES)
            .collect();
        self.pulse_sequence_name = get_string_value(dcm, PULSE_SEQUENCE_NAME)
            .or_else(|| extract_pulse_sequence_name(dcm));
        self.sequence_name = get_string_value(dcm, SEQUENCE_NAME);
        self.echo_time = get_float_value(dcm, ECHO_TIME);
        self.inversion_time = signature.inversion_time;
        self.repetition_time = get_float_value(dcm, REPETITION_TIME);
        self.flip_angle = get_float_value(dcm, FLIP_ANGLE);
        self.pixel_spacing = get_multi_float_value(dcm, PIXEL_SPACING)
            .and_then(|values| PixelSpacing::from_values(&values));
        self.slice_thickness = get_float_value(dcm, SLICE_THICKNESS);
        self.manufacturer = get_string_value(dcm, MANUFACTURER);
        self.manufacturer_model_name = get_string_value(dcm, MANUFACTURER_MODEL_NAME);
        self.device_serial_number = get_string_value(dcm, DEVICE_SERIAL_NUMBER);
        self.institution_name = get_string_value(dcm, INSTITUTION_NAME);
        self.magnetic_field_strength = get_float_value(dcm, MAGNETIC_FIELD_STRENGTH);
        self.body_part_examined = get_string_value(dcm, BODY_PART_EXAMINED);
        self.patient_position = get_string_value(dcm, PATIENT_POSITION);
        self.mr_acquisition_type = get_string_value(dcm, MR_ACQUISITION_TYPE);
        self.operator_name = get_string_value(dcm, OPERATORS_NAME);
        self.sequence_type = detect_sequence_type(&signature);
    }
}
