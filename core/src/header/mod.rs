//! Access to DICOM header elements by tag or keyword
//!
//! A [`Header`] owns the data set of one file, read up to (not including)
//! the pixel data. Values can be fetched raw, as their trimmed string form,
//! or parsed into a [`HeaderValue`] according to the element's VR.

pub mod check;

pub use check::{run_checks, CheckValue, HeaderCheck};

use crate::error::{DcmIndexError, Result};
use crate::extraction::{parse_da, parse_dt, parse_person_name, parse_tm, PIXEL_DATA};
use crate::types::PersonName;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use dicom_core::dictionary::{DataDictionary, DataDictionaryEntry};
use dicom_core::{Tag, VR};
use dicom_dictionary_std::StandardDataDictionary;
use dicom_object::mem::InMemElement;
use dicom_object::{InMemDicomObject, OpenFileOptions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Selects an element either by tag or by dictionary keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOrKeyword<'a> {
    Tag(Tag),
    Keyword(&'a str),
}

impl From<Tag> for TagOrKeyword<'_> {
    fn from(tag: Tag) -> Self {
        TagOrKeyword::Tag(tag)
    }
}

impl<'a> From<&'a str> for TagOrKeyword<'a> {
    fn from(keyword: &'a str) -> Self {
        TagOrKeyword::Keyword(keyword)
    }
}

impl TagOrKeyword<'_> {
    /// Resolves to a tag; unknown keywords resolve to `None`
    ///
    /// Keywords may also be written as `(gggg,eeee)` or `gggg,eeee`.
    pub fn resolve(&self) -> Option<Tag> {
        match self {
            TagOrKeyword::Tag(tag) => Some(*tag),
            TagOrKeyword::Keyword(keyword) => StandardDataDictionary.parse_tag(keyword.trim()),
        }
    }
}

/// Dictionary keyword of a tag, if it is a standard attribute
pub fn keyword_of(tag: Tag) -> Option<String> {
    StandardDataDictionary
        .by_tag(tag)
        .map(|entry| entry.alias().to_string())
}

/// A header value converted according to its VR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum HeaderValue {
    Text(String),
    Texts(Vec<String>),
    Int(i64),
    Ints(Vec<i64>),
    Float(f64),
    Floats(Vec<f64>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    PersonName(PersonName),
    Binary { length: usize },
    Sequence { items: usize },
}

impl HeaderValue {
    /// String forms used for text comparisons
    ///
    /// Dates and times are rendered in ISO 8601.
    pub fn texts(&self) -> Vec<String> {
        match self {
            HeaderValue::Text(s) => vec![s.clone()],
            HeaderValue::Texts(v) => v.clone(),
            HeaderValue::Int(i) => vec![i.to_string()],
            HeaderValue::Ints(v) => v.iter().map(|i| i.to_string()).collect(),
            HeaderValue::Float(f) => vec![f.to_string()],
            HeaderValue::Floats(v) => v.iter().map(|f| f.to_string()).collect(),
            HeaderValue::Date(d) => vec![d.format("%Y-%m-%d").to_string()],
            HeaderValue::Time(t) => vec![t.format("%H:%M:%S%.f").to_string()],
            HeaderValue::DateTime(dt) => vec![dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()],
            HeaderValue::PersonName(name) => vec![name.to_dicom()],
            HeaderValue::Binary { .. } | HeaderValue::Sequence { .. } => Vec::new(),
        }
    }

    /// Numeric forms used for numeric comparisons
    pub fn numbers(&self) -> Vec<f64> {
        match self {
            HeaderValue::Int(i) => vec![*i as f64],
            HeaderValue::Ints(v) => v.iter().map(|i| *i as f64).collect(),
            HeaderValue::Float(f) => vec![*f],
            HeaderValue::Floats(v) => v.clone(),
            HeaderValue::Text(s) => s.trim().parse().into_iter().collect(),
            HeaderValue::Texts(v) => v.iter().filter_map(|s| s.trim().parse().ok()).collect(),
            _ => Vec::new(),
        }
    }

    /// Plain JSON rendering (without the type tag)
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value};
        match self {
            HeaderValue::Text(s) => Value::from(s.as_str()),
            HeaderValue::Texts(v) => json!(v),
            HeaderValue::Int(i) => json!(i),
            HeaderValue::Ints(v) => json!(v),
            HeaderValue::Float(f) => json!(f),
            HeaderValue::Floats(v) => json!(v),
            HeaderValue::PersonName(name) => json!(name),
            HeaderValue::Binary { length } => json!({ "binary_length": length }),
            HeaderValue::Sequence { items } => json!({ "sequence_items": items }),
            other => other
                .texts()
                .into_iter()
                .next()
                .map(Value::from)
                .unwrap_or(Value::Null),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::PersonName(name) => write!(f, "{}", name),
            HeaderValue::Binary { length } => write!(f, "<{} bytes>", length),
            HeaderValue::Sequence { items } => write!(f, "<sequence of {} items>", items),
            other => write!(f, "{}", other.texts().join("\\")),
        }
    }
}

/// Header snapshot keyed by dictionary keyword
pub type HeaderSnapshot = BTreeMap<String, HeaderValue>;

fn is_binary(vr: VR) -> bool {
    matches!(
        vr,
        VR::OB | VR::OD | VR::OF | VR::OL | VR::OV | VR::OW | VR::UN
    )
}

fn single_or_many<T, F, G>(mut values: Vec<T>, one: F, many: G) -> HeaderValue
where
    F: FnOnce(T) -> HeaderValue,
    G: FnOnce(Vec<T>) -> HeaderValue,
{
    if values.len() == 1 {
        match values.pop() {
            Some(v) => one(v),
            None => many(values),
        }
    } else {
        many(values)
    }
}

fn text_value(elem: &InMemElement) -> HeaderValue {
    match elem.to_multi_str() {
        Ok(strs) => {
            let strs: Vec<String> = strs
                .iter()
                .map(|s| s.trim().trim_end_matches('\0').to_string())
                .collect();
            if strs.is_empty() {
                HeaderValue::Text(String::new())
            } else {
                single_or_many(strs, HeaderValue::Text, HeaderValue::Texts)
            }
        }
        Err(_) => HeaderValue::Text(raw_string(elem)),
    }
}

fn raw_string(elem: &InMemElement) -> String {
    elem.to_str()
        .map(|s| s.trim().trim_end_matches('\0').to_string())
        .unwrap_or_default()
}

/// Converts an element into a [`HeaderValue`] according to its VR
pub fn parse_element(elem: &InMemElement) -> HeaderValue {
    let vr = elem.vr();
    match vr {
        VR::SQ => HeaderValue::Sequence {
            items: elem.items().map(|items| items.len()).unwrap_or(0),
        },
        vr if is_binary(vr) => HeaderValue::Binary {
            length: elem.to_bytes().map(|b| b.len()).unwrap_or(0),
        },
        VR::DA => {
            let raw = raw_string(elem);
            parse_da(&raw).map_or(HeaderValue::Text(raw), HeaderValue::Date)
        }
        VR::TM => {
            let raw = raw_string(elem);
            parse_tm(&raw).map_or(HeaderValue::Text(raw), HeaderValue::Time)
        }
        VR::DT => {
            let raw = raw_string(elem);
            parse_dt(&raw).map_or(HeaderValue::Text(raw), HeaderValue::DateTime)
        }
        VR::PN => HeaderValue::PersonName(parse_person_name(&raw_string(elem))),
        VR::IS | VR::SL | VR::SS | VR::UL | VR::US | VR::SV | VR::UV => {
            match elem.to_multi_int::<i64>() {
                Ok(values) if !values.is_empty() => {
                    single_or_many(values, HeaderValue::Int, HeaderValue::Ints)
                }
                _ => text_value(elem),
            }
        }
        // JSON has no NaN or infinity; such values stay textual
        VR::DS | VR::FL | VR::FD => match elem.to_multi_float64() {
            Ok(values) if !values.is_empty() && values.iter().all(|v| v.is_finite()) => {
                single_or_many(values, HeaderValue::Float, HeaderValue::Floats)
            }
            _ => text_value(elem),
        },
        _ => text_value(elem),
    }
}

/// DICOM header of a single file
#[derive(Debug, Clone)]
pub struct Header {
    obj: InMemDicomObject,
}

impl Header {
    /// Reads the header of a DICOM file, stopping before pixel data
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenFileOptions::new()
            .read_until(PIXEL_DATA)
            .open_file(path.as_ref())?;
        Ok(Self {
            obj: file.into_inner(),
        })
    }

    pub fn from_object(obj: InMemDicomObject) -> Self {
        Self { obj }
    }

    pub fn object(&self) -> &InMemDicomObject {
        &self.obj
    }

    /// Looks up an element; unknown keywords and absent tags give `None`
    pub fn element<'a, K: Into<TagOrKeyword<'a>>>(&self, key: K) -> Option<&InMemElement> {
        let tag = key.into().resolve()?;
        self.obj.element(tag).ok()
    }

    /// Returns the parsed value, or the raw string form when `parsed` is false
    pub fn value<'a, K: Into<TagOrKeyword<'a>>>(&self, key: K, parsed: bool) -> Option<HeaderValue> {
        let elem = self.element(key)?;
        Some(if parsed {
            parse_element(elem)
        } else {
            HeaderValue::Text(raw_string(elem))
        })
    }

    /// Like [`Header::value`] but reports the missing key as an error
    pub fn require<'a, K: Into<TagOrKeyword<'a>>>(&self, key: K) -> Result<HeaderValue> {
        let key = key.into();
        self.value(key, true).ok_or_else(|| {
            DcmIndexError::TagNotFound(match key {
                TagOrKeyword::Tag(tag) => tag.to_string(),
                TagOrKeyword::Keyword(k) => k.to_string(),
            })
        })
    }

    /// Parsed values of every public standard element, excluding sequences
    /// and binary data
    pub fn snapshot(&self) -> HeaderSnapshot {
        let mut snapshot = BTreeMap::new();
        for elem in &self.obj {
            let tag = elem.header().tag;
            if tag.group() % 2 == 1 || elem.vr() == VR::SQ || is_binary(elem.vr()) {
                continue;
            }
            if let Some(keyword) = keyword_of(tag) {
                snapshot.insert(keyword, parse_element(elem));
            }
        }
        snapshot
    }

    /// Snapshot rendered as a plain JSON object
    pub fn to_json(&self) -> serde_json::Value {
        snapshot_to_json(&self.snapshot())
    }
}

pub fn snapshot_to_json(snapshot: &HeaderSnapshot) -> serde_json::Value {
    serde_json::Value::Object(
        snapshot
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extraction::*;
    use dicom_core::{DataElement, PrimitiveValue};
    use dicom_object::meta::FileMetaTableBuilder;

    fn strs(values: &[&str]) -> PrimitiveValue {
        PrimitiveValue::Strs(values.iter().map(|s| s.to_string()).collect())
    }

    /// Minimal MR header shared by tests across the crate
    pub(crate) fn mr_object(patient: &str, study: &str, series: &str, sop: &str) -> InMemDicomObject {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(SOP_CLASS_UID, VR::UI, PrimitiveValue::from("1.2.840.10008.5.1.4.1.1.4")));
        dcm.put(DataElement::new(SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from(sop)));
        dcm.put(DataElement::new(MODALITY, VR::CS, PrimitiveValue::from("MR")));
        dcm.put(DataElement::new(PATIENT_ID, VR::LO, PrimitiveValue::from(patient)));
        dcm.put(DataElement::new(PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^John")));
        dcm.put(DataElement::new(PATIENT_SEX, VR::CS, PrimitiveValue::from("M")));
        dcm.put(DataElement::new(PATIENT_BIRTH_DATE, VR::DA, PrimitiveValue::from("19850412")));
        dcm.put(DataElement::new(STUDY_INSTANCE_UID, VR::UI, PrimitiveValue::from(study)));
        dcm.put(DataElement::new(STUDY_DESCRIPTION, VR::LO, PrimitiveValue::from("Head^Routine")));
        dcm.put(DataElement::new(STUDY_DATE, VR::DA, PrimitiveValue::from("20211123")));
        dcm.put(DataElement::new(STUDY_TIME, VR::TM, PrimitiveValue::from("174200")));
        dcm.put(DataElement::new(SERIES_INSTANCE_UID, VR::UI, PrimitiveValue::from(series)));
        dcm.put(DataElement::new(SERIES_NUMBER, VR::IS, PrimitiveValue::from("3")));
        dcm.put(DataElement::new(SERIES_DESCRIPTION, VR::LO, PrimitiveValue::from("t1_mprage_sag")));
        dcm.put(DataElement::new(SERIES_DATE, VR::DA, PrimitiveValue::from("20211123")));
        dcm.put(DataElement::new(SERIES_TIME, VR::TM, PrimitiveValue::from("175012")));
        dcm.put(DataElement::new(PROTOCOL_NAME, VR::LO, PrimitiveValue::from("t1_mprage_sag")));
        dcm.put(DataElement::new(SCANNING_SEQUENCE, VR::CS, strs(&["GR", "IR"])));
        dcm.put(DataElement::new(SEQUENCE_VARIANT, VR::CS, strs(&["SK", "SP", "MP"])));
        dcm.put(DataElement::new(IMAGE_TYPE, VR::CS, strs(&["ORIGINAL", "PRIMARY", "M", "ND"])));
        dcm.put(DataElement::new(ECHO_TIME, VR::DS, PrimitiveValue::from("2.98")));
        dcm.put(DataElement::new(REPETITION_TIME, VR::DS, PrimitiveValue::from("2300")));
        dcm.put(DataElement::new(INVERSION_TIME, VR::DS, PrimitiveValue::from("900")));
        dcm.put(DataElement::new(FLIP_ANGLE, VR::DS, PrimitiveValue::from("9")));
        dcm.put(DataElement::new(PIXEL_SPACING, VR::DS, strs(&["1", "1"])));
        dcm.put(DataElement::new(SLICE_THICKNESS, VR::DS, PrimitiveValue::from("1")));
        dcm.put(DataElement::new(MANUFACTURER, VR::LO, PrimitiveValue::from("SIEMENS")));
        dcm.put(DataElement::new(MAGNETIC_FIELD_STRENGTH, VR::DS, PrimitiveValue::from("3")));
        dcm.put(DataElement::new(INSTANCE_NUMBER, VR::IS, PrimitiveValue::from("1")));
        dcm
    }

    /// Writes `dcm` as a Part 10 file
    pub(crate) fn write_dicom(dcm: InMemDicomObject, path: &Path) {
        let sop = dcm
            .element(SOP_INSTANCE_UID)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "1.2.3".to_string());
        let file = dcm
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax("1.2.840.10008.1.2.1")
                    .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.4")
                    .media_storage_sop_instance_uid(sop),
            )
            .unwrap();
        file.write_to_file(path).unwrap();
    }

    #[test]
    fn test_element_by_keyword_and_tag() {
        let header = Header::from_object(mr_object("P1", "1.1", "1.1.1", "1.1.1.1"));
        assert!(header.element("PatientID").is_some());
        assert!(header.element(PATIENT_ID).is_some());
        assert!(header.element("(0010,0020)").is_some());
        assert!(header.element("NotAKeyword").is_none());
        assert!(header.element("AccessionNumber").is_none());
    }

    #[test]
    fn test_value_conversion_per_vr() {
        let header = Header::from_object(mr_object("P1", "1.1", "1.1.1", "1.1.1.1"));

        assert_eq!(
            header.value("PatientID", true),
            Some(HeaderValue::Text("P1".to_string()))
        );
        assert_eq!(
            header.value("ScanningSequence", true),
            Some(HeaderValue::Texts(vec!["GR".to_string(), "IR".to_string()]))
        );
        assert_eq!(header.value("SeriesNumber", true), Some(HeaderValue::Int(3)));
        assert_eq!(header.value("EchoTime", true), Some(HeaderValue::Float(2.98)));
        assert_eq!(
            header.value("PixelSpacing", true),
            Some(HeaderValue::Floats(vec![1.0, 1.0]))
        );
        assert_eq!(
            header.value("StudyDate", true),
            NaiveDate::from_ymd_opt(2021, 11, 23).map(HeaderValue::Date)
        );
        assert_eq!(
            header.value("StudyTime", true),
            NaiveTime::from_hms_opt(17, 42, 0).map(HeaderValue::Time)
        );
        match header.value("PatientName", true) {
            Some(HeaderValue::PersonName(name)) => assert_eq!(name.full_name(), "John Doe"),
            other => panic!("unexpected value {:?}", other),
        }
    }

    #[test]
    fn test_raw_value() {
        let header = Header::from_object(mr_object("P1", "1.1", "1.1.1", "1.1.1.1"));
        assert_eq!(
            header.value("StudyDate", false),
            Some(HeaderValue::Text("20211123".to_string()))
        );
    }

    #[test]
    fn test_non_finite_decimal_stays_text() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(ECHO_TIME, VR::DS, PrimitiveValue::from("NaN")));
        dcm.put(DataElement::new(REPETITION_TIME, VR::DS, PrimitiveValue::from("inf")));
        let header = Header::from_object(dcm);
        assert_eq!(
            header.value(ECHO_TIME, true),
            Some(HeaderValue::Text("NaN".to_string()))
        );
        assert_eq!(
            header.value(REPETITION_TIME, true),
            Some(HeaderValue::Text("inf".to_string()))
        );
    }

    #[test]
    fn test_invalid_date_degrades_to_text() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(STUDY_DATE, VR::DA, PrimitiveValue::from("2021XX23")));
        let header = Header::from_object(dcm);
        assert_eq!(
            header.value(STUDY_DATE, true),
            Some(HeaderValue::Text("2021XX23".to_string()))
        );
    }

    #[test]
    fn test_binary_and_sequence_values() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            Tag(0x0029, 0x1010),
            VR::OB,
            PrimitiveValue::from(vec![0u8; 16]),
        ));
        let header = Header::from_object(dcm);
        assert_eq!(
            header.value(Tag(0x0029, 0x1010), true),
            Some(HeaderValue::Binary { length: 16 })
        );
        assert!(header.snapshot().is_empty());
    }

    #[test]
    fn test_require_reports_missing() {
        let header = Header::from_object(InMemDicomObject::new_empty());
        assert!(matches!(
            header.require("PatientID"),
            Err(DcmIndexError::TagNotFound(_))
        ));
    }

    #[test]
    fn test_snapshot_keys_by_keyword() {
        let header = Header::from_object(mr_object("P1", "1.1", "1.1.1", "1.1.1.1"));
        let snapshot = header.snapshot();
        assert_eq!(
            snapshot.get("Manufacturer"),
            Some(&HeaderValue::Text("SIEMENS".to_string()))
        );
        assert!(snapshot.contains_key("SeriesInstanceUID"));

        let json = header.to_json();
        assert_eq!(json["SeriesNumber"], serde_json::json!(3));
        assert_eq!(json["StudyDate"], serde_json::json!("2021-11-23"));
    }

    #[test]
    fn test_open_stops_before_pixel_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.dcm");
        let mut dcm = mr_object("P1", "1.1", "1.1.1", "1.1.1.1");
        dcm.put(DataElement::new(PIXEL_DATA, VR::OW, PrimitiveValue::from(vec![0u8; 32])));
        write_dicom(dcm, &path);

        let header = Header::open(&path).unwrap();
        assert_eq!(
            header.value("PatientID", true),
            Some(HeaderValue::Text("P1".to_string()))
        );
        assert!(header.element(PIXEL_DATA).is_none());
    }

    #[test]
    fn test_open_missing_file_fails() {
        assert!(Header::open("/nonexistent/file.dcm").is_err());
    }

    #[test]
    fn test_header_value_serde_roundtrip() {
        let value = HeaderValue::Floats(vec![0.5, 0.75]);
        let json = serde_json::to_string(&value).unwrap();
        let back: HeaderValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
