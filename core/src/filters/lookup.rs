//! Lookup primitives shared by the filter sets and header checks

use crate::error::{DcmIndexError, Result};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime};
use std::fmt;

/// Comparison applied between a stored value and a filter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookup {
    #[default]
    Exact,
    IExact,
    Contains,
    IContains,
    StartsWith,
    EndsWith,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Lookup {
    /// Lookups offered for free-text fields (`<field>_lookup` parameters)
    pub const TEXT_CHOICES: [Lookup; 6] = [
        Lookup::Exact,
        Lookup::IExact,
        Lookup::Contains,
        Lookup::IContains,
        Lookup::StartsWith,
        Lookup::EndsWith,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::IExact => "iexact",
            Lookup::Contains => "contains",
            Lookup::IContains => "icontains",
            Lookup::StartsWith => "startswith",
            Lookup::EndsWith => "endswith",
            Lookup::Gt => "gt",
            Lookup::Gte => "gte",
            Lookup::Lt => "lt",
            Lookup::Lte => "lte",
            Lookup::In => "in",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let lookup = match s.trim().to_lowercase().as_str() {
            "exact" => Lookup::Exact,
            "iexact" => Lookup::IExact,
            "contains" => Lookup::Contains,
            "icontains" => Lookup::IContains,
            "startswith" => Lookup::StartsWith,
            "endswith" => Lookup::EndsWith,
            "gt" => Lookup::Gt,
            "gte" => Lookup::Gte,
            "lt" => Lookup::Lt,
            "lte" => Lookup::Lte,
            "in" => Lookup::In,
            other => {
                return Err(DcmIndexError::FilterError(format!(
                    "unknown lookup '{}'",
                    other
                )))
            }
        };
        Ok(lookup)
    }

    /// Parses a lookup restricted to [`Lookup::TEXT_CHOICES`]
    pub fn parse_text(s: &str) -> Result<Self> {
        let lookup = Self::parse(s)?;
        if Self::TEXT_CHOICES.contains(&lookup) {
            Ok(lookup)
        } else {
            Err(DcmIndexError::FilterError(format!(
                "lookup '{}' is not available for text fields",
                lookup
            )))
        }
    }

    /// Applies the lookup to two strings
    ///
    /// Ordering lookups compare lexicographically; `In` treats `expected`
    /// as a comma separated list.
    pub fn matches_str(&self, candidate: &str, expected: &str) -> bool {
        match self {
            Lookup::Exact => candidate == expected,
            Lookup::IExact => candidate.to_lowercase() == expected.to_lowercase(),
            Lookup::Contains => candidate.contains(expected),
            Lookup::IContains => candidate.to_lowercase().contains(&expected.to_lowercase()),
            Lookup::StartsWith => candidate.starts_with(expected),
            Lookup::EndsWith => candidate.ends_with(expected),
            Lookup::Gt => candidate > expected,
            Lookup::Gte => candidate >= expected,
            Lookup::Lt => candidate < expected,
            Lookup::Lte => candidate <= expected,
            Lookup::In => split_list(expected).iter().any(|e| e == candidate),
        }
    }

    /// Applies the lookup to two numbers; text-only lookups compare the decimal forms
    pub fn matches_f64(&self, candidate: f64, expected: f64) -> bool {
        match self {
            Lookup::Exact | Lookup::IExact | Lookup::In => candidate == expected,
            Lookup::Gt => candidate > expected,
            Lookup::Gte => candidate >= expected,
            Lookup::Lt => candidate < expected,
            Lookup::Lte => candidate <= expected,
            _ => self.matches_str(&candidate.to_string(), &expected.to_string()),
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Splits a comma separated parameter, dropping empty entries
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// A text value together with the lookup used to match it
#[derive(Debug, Clone, PartialEq)]
pub struct TextLookup {
    pub value: String,
    pub lookup: Lookup,
}

impl TextLookup {
    pub fn new(value: impl Into<String>, lookup: Lookup) -> Self {
        Self {
            value: value.into(),
            lookup,
        }
    }

    pub fn exact(value: impl Into<String>) -> Self {
        Self::new(value, Lookup::Exact)
    }

    pub fn icontains(value: impl Into<String>) -> Self {
        Self::new(value, Lookup::IContains)
    }

    /// A missing field never matches
    pub fn matches(&self, candidate: Option<&str>) -> bool {
        candidate.is_some_and(|c| self.lookup.matches_str(c, &self.value))
    }
}

/// Case-insensitive containment of any of the values (OR)
///
/// An empty value list matches everything.
pub fn in_icontains(candidate: Option<&str>, values: &[String]) -> bool {
    if values.is_empty() {
        return true;
    }
    let Some(candidate) = candidate else {
        return false;
    };
    let candidate = candidate.to_lowercase();
    values
        .iter()
        .any(|v| candidate.contains(&v.to_lowercase()))
}

/// Exact array match: same members and same length, order ignored
///
/// An empty filter matches everything.
pub fn array_exact<T: PartialEq>(candidate: &[T], values: &[T]) -> bool {
    if values.is_empty() {
        return true;
    }
    candidate.len() == values.len() && values.iter().all(|v| candidate.contains(v))
}

/// Inclusive numeric range; either bound may be open
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// A missing value only matches a fully open range
    pub fn matches(&self, value: Option<f64>) -> bool {
        if self.is_open() {
            return true;
        }
        match value {
            None => false,
            Some(v) => self.min.map_or(true, |min| v >= min) && self.max.map_or(true, |max| v <= max),
        }
    }
}

/// Inclusive range over any ordered value (dates, times)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedRange<T> {
    pub after: Option<T>,
    pub before: Option<T>,
}

impl<T> Default for OrderedRange<T> {
    fn default() -> Self {
        Self {
            after: None,
            before: None,
        }
    }
}

impl<T: PartialOrd + Copy> OrderedRange<T> {
    pub fn new(after: Option<T>, before: Option<T>) -> Self {
        Self { after, before }
    }

    pub fn is_open(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }

    /// A missing value only matches a fully open range
    pub fn matches(&self, value: Option<T>) -> bool {
        if self.is_open() {
            return true;
        }
        match value {
            None => false,
            Some(v) => {
                self.after.map_or(true, |a| v >= a) && self.before.map_or(true, |b| v <= b)
            }
        }
    }
}

pub type DateRange = OrderedRange<NaiveDate>;
pub type TimeRange = OrderedRange<NaiveTime>;

/// Relative date shortcuts (`date=today` etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShortcut {
    Today,
    Yesterday,
    /// The past 7 days, today included
    Week,
    /// The current calendar month
    Month,
    /// The current calendar year
    Year,
}

impl DateShortcut {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "today" => Ok(DateShortcut::Today),
            "yesterday" => Ok(DateShortcut::Yesterday),
            "week" => Ok(DateShortcut::Week),
            "month" => Ok(DateShortcut::Month),
            "year" => Ok(DateShortcut::Year),
            other => Err(DcmIndexError::FilterError(format!(
                "unknown date choice '{}'",
                other
            ))),
        }
    }

    /// Resolves the shortcut to a concrete range relative to `today`
    pub fn range(&self, today: NaiveDate) -> DateRange {
        match self {
            DateShortcut::Today => DateRange::new(Some(today), Some(today)),
            DateShortcut::Yesterday => {
                let day = today - Duration::days(1);
                DateRange::new(Some(day), Some(day))
            }
            DateShortcut::Week => DateRange::new(Some(today - Duration::days(7)), Some(today)),
            DateShortcut::Month => {
                let first = today.with_day(1);
                let last = first
                    .and_then(|d| d.checked_add_months(Months::new(1)))
                    .map(|d| d - Duration::days(1));
                DateRange::new(first, last)
            }
            DateShortcut::Year => DateRange::new(
                today.with_ordinal(1),
                NaiveDate::from_ymd_opt(today.year(), 12, 31),
            ),
        }
    }
}

pub fn parse_f64(name: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| DcmIndexError::FilterError(format!("{}: '{}' is not a number", name, value)))
}

pub fn parse_i64(name: &str, value: &str) -> Result<i64> {
    value.trim().parse().map_err(|_| {
        DcmIndexError::FilterError(format!("{}: '{}' is not an integer", name, value))
    })
}

pub fn parse_u64(name: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        DcmIndexError::FilterError(format!("{}: '{}' is not a valid id", name, value))
    })
}

/// Parses `YYYY-MM-DD` (or a DICOM DA value)
pub fn parse_date(name: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| crate::extraction::parse_da(value))
        .ok_or_else(|| DcmIndexError::FilterError(format!("{}: '{}' is not a date", name, value)))
}

/// Parses `HH:MM[:SS]` (or a DICOM TM value)
pub fn parse_time(name: &str, value: &str) -> Result<NaiveTime> {
    crate::extraction::parse_tm(value)
        .ok_or_else(|| DcmIndexError::FilterError(format!("{}: '{}' is not a time", name, value)))
}
