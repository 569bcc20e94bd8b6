use super::lookup::{
    array_exact, in_icontains, parse_date, parse_f64, parse_i64, parse_u64, DateRange,
    DateShortcut, Lookup, NumericRange, TextLookup, TimeRange,
};
use super::{FilterSet, QueryParams};
use crate::error::{DcmIndexError, Result};
use crate::header::{run_checks, HeaderCheck};
use crate::models::Series;
use crate::store::Registry;
use crate::types::{Modality, ScanningSequence, SequenceType, SequenceVariant};
use chrono::{Local, NaiveDate};

/// Query value selecting series of unknown sequence type
pub const NULL_CHOICE: &str = "null";

/// Filter over [`Series`] rows
///
/// Every criterion left at its default matches everything; set criteria
/// are combined with AND.
///
/// # Example
///
/// ```
/// use dcmindex_core::filters::{Lookup, SeriesFilter, TextLookup};
/// use dcmindex_core::types::ScanningSequence;
///
/// let filter = SeriesFilter::default()
///     .with_description(TextLookup::new("mprage", Lookup::IContains))
///     .with_scanning_sequence(vec![ScanningSequence::Gr, ScanningSequence::Ir])
///     .with_echo_time(Some(2.0), Some(4.0));
///
/// assert_eq!(filter.scanning_sequence.len(), 2);
/// assert_eq!(filter.echo_time.min, Some(2.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SeriesFilter {
    pub id: Option<u64>,
    pub uid: Option<String>,
    pub number: Option<i64>,

    /// Primary key of the related patient
    pub patient_id: Option<u64>,

    pub study_uid: Option<String>,

    /// Study description, case-insensitive containment of any value
    pub study_description: Vec<String>,

    /// Modality code (exact)
    pub modality: Option<String>,

    pub description: Option<TextLookup>,

    /// Case-insensitive containment
    pub protocol_name: Option<String>,

    /// Exact array match (members and length)
    pub scanning_sequence: Vec<ScanningSequence>,

    /// Exact array match (members and length)
    pub sequence_variant: Vec<SequenceVariant>,

    pub flip_angle: Option<f64>,

    /// Series date, from the `date` shortcut combined with `date_after` / `date_before`
    pub date: DateRange,
    pub date_shortcut: Option<DateRange>,
    pub time: TimeRange,

    pub manufacturer: Option<String>,
    pub manufacturer_model_name: Option<String>,
    pub magnetic_field_strength: Option<f64>,
    pub device_serial_number: Option<String>,
    pub institution_name: Option<String>,

    pub pulse_sequence_name: Vec<String>,
    pub sequence_name: Vec<String>,

    /// Row spacing (first pixel spacing component)
    pub pixel_spacing: NumericRange,
    pub slice_thickness: NumericRange,
    pub repetition_time: NumericRange,
    pub inversion_time: NumericRange,
    pub echo_time: NumericRange,

    /// Checks against the header of the series' first image
    pub header_fields: Vec<HeaderCheck>,

    /// Accepted sequence types; `None` inside the list selects Unknown
    pub sequence_type: Option<Vec<Option<SequenceType>>>,
}

fn parse_codes<T>(
    query: &QueryParams,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>> {
    query
        .get_all(key)
        .into_iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            parse(v).ok_or_else(|| {
                DcmIndexError::FilterError(format!("{}: '{}' is not a valid choice", key, v))
            })
        })
        .collect()
}

/// Accepts only known modality codes and normalizes them to upper case
fn parse_modality(key: &str, value: &str) -> Result<String> {
    let modality = Modality::from_str(value);
    if modality.is_unknown() {
        return Err(DcmIndexError::FilterError(format!(
            "{}: '{}' is not a valid choice",
            key, value
        )));
    }
    Ok(modality.code().to_string())
}

impl SeriesFilter {
    /// Builder: description lookup
    pub fn with_description(mut self, description: TextLookup) -> Self {
        self.description = Some(description);
        self
    }

    /// Builder: exact scanning sequence combination
    pub fn with_scanning_sequence(mut self, codes: Vec<ScanningSequence>) -> Self {
        self.scanning_sequence = codes;
        self
    }

    /// Builder: exact sequence variant combination
    pub fn with_sequence_variant(mut self, codes: Vec<SequenceVariant>) -> Self {
        self.sequence_variant = codes;
        self
    }

    /// Builder: inclusive echo time range
    pub fn with_echo_time(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.echo_time = NumericRange::new(min, max);
        self
    }

    /// Builder: accepted sequence types (`None` selects Unknown)
    pub fn with_sequence_types(mut self, types: Vec<Option<SequenceType>>) -> Self {
        self.sequence_type = Some(types);
        self
    }

    /// Builder: relative date shortcut resolved against `today`
    pub fn with_date_shortcut(mut self, shortcut: DateShortcut, today: NaiveDate) -> Self {
        self.date_shortcut = Some(shortcut.range(today));
        self
    }

    /// Builder: header checks against the first image
    pub fn with_header_fields(mut self, checks: Vec<HeaderCheck>) -> Self {
        self.header_fields = checks;
        self
    }

    fn text_exact(expected: &Option<String>, value: Option<&str>) -> bool {
        expected
            .as_deref()
            .map_or(true, |e| value.is_some_and(|v| v == e))
    }

    fn float_exact(expected: Option<f64>, value: Option<f64>) -> bool {
        expected.map_or(true, |e| value.is_some_and(|v| v == e))
    }
}

impl FilterSet<Series> for SeriesFilter {
    fn from_query(query: &QueryParams) -> Result<Self> {
        let sequence_type = {
            let values = query.get_all("sequence_type");
            if values.is_empty() {
                None
            } else {
                Some(
                    values
                        .into_iter()
                        .map(|v| {
                            if v.eq_ignore_ascii_case(NULL_CHOICE) {
                                Ok(None)
                            } else {
                                SequenceType::from_key(v).map(Some).ok_or_else(|| {
                                    DcmIndexError::FilterError(format!(
                                        "sequence_type: '{}' is not a valid choice",
                                        v
                                    ))
                                })
                            }
                        })
                        .collect::<Result<Vec<_>>>()?,
                )
            }
        };

        let header_fields = match query.get("header_fields") {
            Some(json) => HeaderCheck::parse_json(json)?,
            None => Vec::new(),
        };

        let date_shortcut = match query.get("date") {
            Some(choice) => Some(DateShortcut::parse(choice)?.range(Local::now().date_naive())),
            None => None,
        };

        Ok(Self {
            id: query.get_parsed("id", parse_u64)?,
            uid: query.get("uid").map(str::to_string),
            number: query.get_parsed("number", parse_i64)?,
            patient_id: query.get_parsed("patient_id", parse_u64)?,
            study_uid: query.get("study_uid").map(str::to_string),
            study_description: query.list("study_description"),
            modality: query.get_parsed("modality", parse_modality)?,
            description: query.text_lookup("description", Lookup::Exact)?,
            protocol_name: query.get("protocol_name").map(str::to_string),
            scanning_sequence: parse_codes(query, "scanning_sequence", ScanningSequence::from_code)?,
            sequence_variant: parse_codes(query, "sequence_variant", SequenceVariant::from_code)?,
            flip_angle: query.get_parsed("flip_angle", parse_f64)?,
            date: DateRange::new(
                query.get_parsed("date_after", parse_date)?,
                query.get_parsed("date_before", parse_date)?,
            ),
            date_shortcut,
            time: query.time_range("time")?,
            manufacturer: query.get("manufacturer").map(str::to_string),
            manufacturer_model_name: query.get("manufacturer_model_name").map(str::to_string),
            magnetic_field_strength: query.get_parsed("magnetic_field_strength", parse_f64)?,
            device_serial_number: query.get("device_serial_number").map(str::to_string),
            institution_name: query.get("institution_name").map(str::to_string),
            pulse_sequence_name: query.list("pulse_sequence_name"),
            sequence_name: query.list("sequence_name"),
            pixel_spacing: query.numeric_range("pixel_spacing")?,
            slice_thickness: query.numeric_range("slice_thickness")?,
            repetition_time: query.numeric_range("repetition_time")?,
            inversion_time: query.numeric_range("inversion_time")?,
            echo_time: query.numeric_range("echo_time")?,
            header_fields,
            sequence_type,
        })
    }

    fn matches(&self, registry: &Registry, series: &Series) -> bool {
        if self.id.is_some_and(|id| id != series.id)
            || self.uid.as_deref().is_some_and(|uid| uid != series.uid)
            || self
                .number
                .is_some_and(|n| series.number.map(i64::from) != Some(n))
            || self.patient_id.is_some_and(|id| id != series.patient_id)
        {
            return false;
        }

        if self.study_uid.is_some() || !self.study_description.is_empty() {
            let study = registry.studies.get(series.study_id);
            if let Some(uid) = &self.study_uid {
                if study.map(|s| s.uid.as_str()) != Some(uid.as_str()) {
                    return false;
                }
            }
            if !in_icontains(
                study.and_then(|s| s.description.as_deref()),
                &self.study_description,
            ) {
                return false;
            }
        }

        if !Self::text_exact(&self.modality, series.modality.map(|m| m.code())) {
            return false;
        }
        if self
            .description
            .as_ref()
            .is_some_and(|d| !d.matches(series.description.as_deref()))
        {
            return false;
        }
        if self
            .protocol_name
            .as_ref()
            .is_some_and(|p| !TextLookup::icontains(p.as_str()).matches(series.protocol_name.as_deref()))
        {
            return false;
        }
        if !array_exact(&series.scanning_sequence, &self.scanning_sequence)
            || !array_exact(&series.sequence_variant, &self.sequence_variant)
        {
            return false;
        }
        if !Self::float_exact(self.flip_angle, series.flip_angle)
            || !Self::float_exact(self.magnetic_field_strength, series.magnetic_field_strength)
        {
            return false;
        }
        if !self.date.matches(series.date)
            || !self.date_shortcut.map_or(true, |r| r.matches(series.date))
            || !self.time.matches(series.time)
        {
            return false;
        }
        if !Self::text_exact(&self.manufacturer, series.manufacturer.as_deref())
            || !Self::text_exact(
                &self.manufacturer_model_name,
                series.manufacturer_model_name.as_deref(),
            )
            || !Self::text_exact(
                &self.device_serial_number,
                series.device_serial_number.as_deref(),
            )
            || !Self::text_exact(&self.institution_name, series.institution_name.as_deref())
        {
            return false;
        }
        if !in_icontains(series.pulse_sequence_name.as_deref(), &self.pulse_sequence_name)
            || !in_icontains(series.sequence_name.as_deref(), &self.sequence_name)
        {
            return false;
        }
        if !self.pixel_spacing.matches(series.pixel_spacing.map(|p| p.row))
            || !self.slice_thickness.matches(series.slice_thickness)
            || !self.repetition_time.matches(series.repetition_time)
            || !self.inversion_time.matches(series.inversion_time)
            || !self.echo_time.matches(series.echo_time)
        {
            return false;
        }
        if let Some(types) = &self.sequence_type {
            if !types.contains(&series.sequence_type) {
                return false;
            }
        }
        if !self.header_fields.is_empty() {
            let passes = registry
                .first_image_of_series(series.id)
                .is_some_and(|image| run_checks(&self.header_fields, &image.header));
            if !passes {
                return false;
            }
        }
        true
    }
}
