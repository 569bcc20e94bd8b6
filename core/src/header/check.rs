//! Lookups evaluated against header snapshots
//!
//! Checks are written as a JSON object keyed by keyword:
//!
//! ```json
//! {"Manufacturer": "SIEMENS", "EchoTime": {"lookup": "lt", "value": 3}}
//! ```

use super::{HeaderSnapshot, HeaderValue};
use crate::error::{DcmIndexError, Result};
use crate::filters::lookup::{split_list, Lookup};
use serde_json::Value;

/// Expected value of a check
#[derive(Debug, Clone, PartialEq)]
pub enum CheckValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

impl CheckValue {
    fn from_json(keyword: &str, value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(CheckValue::Text(s.clone())),
            Value::Number(n) => n.as_f64().map(CheckValue::Number).ok_or_else(|| {
                DcmIndexError::FilterError(format!("{}: unsupported number {}", keyword, n))
            }),
            Value::Bool(b) => Ok(CheckValue::Text(b.to_string())),
            Value::Array(items) => Ok(CheckValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            other => Err(DcmIndexError::FilterError(format!(
                "{}: unsupported value {}",
                keyword, other
            ))),
        }
    }
}

/// A single `{keyword, lookup, value}` check
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCheck {
    pub keyword: String,
    pub lookup: Lookup,
    pub value: CheckValue,
}

impl HeaderCheck {
    pub fn new(keyword: impl Into<String>, lookup: Lookup, value: CheckValue) -> Self {
        Self {
            keyword: keyword.into(),
            lookup,
            value,
        }
    }

    /// Parses the JSON object form into a list of checks
    pub fn parse_json(text: &str) -> Result<Vec<HeaderCheck>> {
        let parsed: Value = serde_json::from_str(text)
            .map_err(|e| DcmIndexError::FilterError(format!("header_fields: {}", e)))?;
        let Value::Object(fields) = parsed else {
            return Err(DcmIndexError::FilterError(
                "header_fields: expected a JSON object".to_string(),
            ));
        };

        fields
            .iter()
            .map(|(keyword, spec)| match spec {
                Value::Object(inner) => {
                    let lookup = match inner.get("lookup") {
                        Some(Value::String(name)) => Lookup::parse(name)?,
                        Some(other) => {
                            return Err(DcmIndexError::FilterError(format!(
                                "{}: lookup must be a string, got {}",
                                keyword, other
                            )))
                        }
                        None => Lookup::Exact,
                    };
                    let value = inner.get("value").ok_or_else(|| {
                        DcmIndexError::FilterError(format!("{}: missing value", keyword))
                    })?;
                    Ok(HeaderCheck::new(
                        keyword.as_str(),
                        lookup,
                        CheckValue::from_json(keyword, value)?,
                    ))
                }
                scalar => Ok(HeaderCheck::new(
                    keyword.as_str(),
                    Lookup::Exact,
                    CheckValue::from_json(keyword, scalar)?,
                )),
            })
            .collect()
    }

    fn is_ordering(&self) -> bool {
        matches!(
            self.lookup,
            Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte
        )
    }

    /// Evaluates the check against one header value
    ///
    /// Multi-valued elements pass if any of their values passes.
    pub fn matches(&self, value: &HeaderValue) -> bool {
        match &self.value {
            CheckValue::Number(expected) => value
                .numbers()
                .iter()
                .any(|n| self.lookup.matches_f64(*n, *expected)),
            CheckValue::Text(expected) => {
                if self.is_ordering() {
                    if let Ok(expected) = expected.trim().parse::<f64>() {
                        let numbers = value.numbers();
                        if !numbers.is_empty() {
                            return numbers.iter().any(|n| self.lookup.matches_f64(*n, expected));
                        }
                    }
                }
                value
                    .texts()
                    .iter()
                    .any(|t| self.lookup.matches_str(t, expected))
            }
            CheckValue::List(expected) => {
                let expected: Vec<String> = expected
                    .iter()
                    .flat_map(|e| split_list(e))
                    .collect();
                value.texts().iter().any(|t| expected.contains(t))
            }
        }
    }

    /// Evaluates the check; a missing keyword fails
    pub fn passes(&self, snapshot: &HeaderSnapshot) -> bool {
        snapshot
            .get(&self.keyword)
            .is_some_and(|value| self.matches(value))
    }
}

/// True iff every check passes
pub fn run_checks(checks: &[HeaderCheck], snapshot: &HeaderSnapshot) -> bool {
    checks.iter().all(|check| check.passes(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::tests::mr_object;
    use crate::header::Header;

    fn snapshot() -> HeaderSnapshot {
        Header::from_object(mr_object("P1", "1.1", "1.1.1", "1.1.1.1")).snapshot()
    }

    #[test]
    fn test_parse_scalar_and_object_forms() {
        let checks = HeaderCheck::parse_json(
            r#"{"Manufacturer": "SIEMENS", "EchoTime": {"lookup": "lt", "value": 3}}"#,
        )
        .unwrap();
        assert_eq!(checks.len(), 2);
        assert!(checks.contains(&HeaderCheck::new(
            "Manufacturer",
            Lookup::Exact,
            CheckValue::Text("SIEMENS".to_string())
        )));
        assert!(checks.contains(&HeaderCheck::new(
            "EchoTime",
            Lookup::Lt,
            CheckValue::Number(3.0)
        )));
    }

    #[test]
    fn test_parse_errors() {
        assert!(HeaderCheck::parse_json("not json").is_err());
        assert!(HeaderCheck::parse_json("[1, 2]").is_err());
        assert!(HeaderCheck::parse_json(r#"{"EchoTime": {"lookup": "lt"}}"#).is_err());
        assert!(HeaderCheck::parse_json(r#"{"EchoTime": {"lookup": "near", "value": 1}}"#).is_err());
    }

    #[test]
    fn test_run_checks() {
        let snapshot = snapshot();
        let pass = HeaderCheck::parse_json(
            r#"{
                "Manufacturer": {"lookup": "iexact", "value": "siemens"},
                "EchoTime": {"lookup": "lt", "value": 3},
                "ScanningSequence": "IR",
                "SeriesDescription": {"lookup": "icontains", "value": "MPRAGE"},
                "StudyDate": {"lookup": "gte", "value": "2021-01-01"},
                "RepetitionTime": {"lookup": "gt", "value": "1000"}
            }"#,
        )
        .unwrap();
        assert!(run_checks(&pass, &snapshot));

        let fail = HeaderCheck::parse_json(r#"{"EchoTime": {"lookup": "gt", "value": 3}}"#).unwrap();
        assert!(!run_checks(&fail, &snapshot));
    }

    #[test]
    fn test_missing_keyword_fails() {
        let checks = HeaderCheck::parse_json(r#"{"AccessionNumber": "A1"}"#).unwrap();
        assert!(!run_checks(&checks, &snapshot()));
        assert!(run_checks(&[], &snapshot()));
    }

    #[test]
    fn test_in_lookup() {
        let snapshot = snapshot();
        let checks =
            HeaderCheck::parse_json(r#"{"Manufacturer": {"lookup": "in", "value": ["GE", "SIEMENS"]}}"#)
                .unwrap();
        assert!(run_checks(&checks, &snapshot));

        let checks =
            HeaderCheck::parse_json(r#"{"Manufacturer": {"lookup": "in", "value": "GE,Philips"}}"#)
                .unwrap();
        assert!(!run_checks(&checks, &snapshot));
    }
}
