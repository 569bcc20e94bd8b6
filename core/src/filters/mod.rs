//! Query-string filter sets for the four record kinds
//!
//! Every filter set is built from [`QueryParams`] (or through its builder
//! methods) and then applied to registry rows. Empty parameter values are
//! ignored; unknown parameters are ignored; malformed values are a
//! [`DcmIndexError::FilterError`].

pub mod image;
pub mod lookup;
pub mod patient;
pub mod series;
pub mod study;

pub use image::ImageFilter;
pub use lookup::{DateRange, DateShortcut, Lookup, NumericRange, TextLookup, TimeRange};
pub use patient::PatientFilter;
pub use series::SeriesFilter;
pub use study::StudyFilter;

use crate::error::{DcmIndexError, Result};
use crate::store::Registry;

/// Decoded `application/x-www-form-urlencoded` parameters, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query.trim_start_matches('?'))
            .map_err(|e| DcmIndexError::FilterError(format!("malformed query string: {}", e)))?;
        Ok(Self { pairs })
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Last non-empty value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
    }

    /// All non-empty values of a repeated parameter
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.trim())
            .collect()
    }

    pub fn get_parsed<T>(&self, key: &str, parse: impl Fn(&str, &str) -> Result<T>) -> Result<Option<T>> {
        self.get(key).map(|v| parse(key, v)).transpose()
    }

    /// `<key>` with its `<key>_lookup` companion (default: `default`)
    pub fn text_lookup(&self, key: &str, default: Lookup) -> Result<Option<TextLookup>> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let lookup = match self.get(&format!("{}_lookup", key)) {
            Some(name) => Lookup::parse_text(name)?,
            None => default,
        };
        Ok(Some(TextLookup::new(value, lookup)))
    }

    /// `<key>_min` / `<key>_max`
    pub fn numeric_range(&self, key: &str) -> Result<NumericRange> {
        Ok(NumericRange::new(
            self.get_parsed(&format!("{}_min", key), lookup::parse_f64)?,
            self.get_parsed(&format!("{}_max", key), lookup::parse_f64)?,
        ))
    }

    /// `<prefix>_after` / `<prefix>_before` as dates
    pub fn date_range(&self, prefix: &str) -> Result<DateRange> {
        Ok(DateRange::new(
            self.get_parsed(&format!("{}_after", prefix), lookup::parse_date)?,
            self.get_parsed(&format!("{}_before", prefix), lookup::parse_date)?,
        ))
    }

    /// `<prefix>_after` / `<prefix>_before` as times of day
    pub fn time_range(&self, prefix: &str) -> Result<TimeRange> {
        Ok(TimeRange::new(
            self.get_parsed(&format!("{}_after", prefix), lookup::parse_time)?,
            self.get_parsed(&format!("{}_before", prefix), lookup::parse_time)?,
        ))
    }

    /// Comma separated values of `key`, for in-icontains lookups
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key).map(lookup::split_list).unwrap_or_default()
    }
}

/// A filter over one kind of registry row
pub trait FilterSet<T>: Sized {
    fn from_query(query: &QueryParams) -> Result<Self>;

    /// Relations are resolved through `registry`
    fn matches(&self, registry: &Registry, row: &T) -> bool;

    fn apply<'a, I>(&self, registry: &Registry, rows: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        rows.into_iter()
            .filter(|row| self.matches(registry, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_string() {
        let query = QueryParams::parse("?scanning_sequence=SE&scanning_sequence=IR&description=t1%20mprage&empty=").unwrap();
        assert_eq!(query.get_all("scanning_sequence"), vec!["SE", "IR"]);
        assert_eq!(query.get("description"), Some("t1 mprage"));
        assert_eq!(query.get("empty"), None);
        assert_eq!(query.get("missing"), None);
    }

    #[test]
    fn test_text_lookup() {
        let query = QueryParams::from_pairs([("description", "mprage"), ("description_lookup", "icontains")]);
        assert_eq!(
            query.text_lookup("description", Lookup::Exact).unwrap(),
            Some(TextLookup::icontains("mprage"))
        );

        let bad = QueryParams::from_pairs([("description", "x"), ("description_lookup", "gt")]);
        assert!(bad.text_lookup("description", Lookup::Exact).is_err());
    }

    #[test]
    fn test_ranges() {
        let query = QueryParams::from_pairs([
            ("echo_time_min", "2"),
            ("date_after", "2021-01-01"),
            ("time_before", "12:30"),
        ]);
        assert_eq!(query.numeric_range("echo_time").unwrap(), NumericRange::new(Some(2.0), None));
        assert!(query.date_range("date").unwrap().after.is_some());
        assert!(query.time_range("time").unwrap().before.is_some());

        let bad = QueryParams::from_pairs([("echo_time_max", "fast")]);
        assert!(bad.numeric_range("echo_time").is_err());
    }
}
