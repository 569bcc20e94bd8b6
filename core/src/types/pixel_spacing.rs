use crate::error::{DcmIndexError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// In-plane pixel spacing in millimeters (row spacing, column spacing)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSpacing {
    pub row: f64,
    pub col: f64,
}

impl PixelSpacing {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }

    /// Builds spacing from a decoded multi-valued DS element
    ///
    /// A single value is taken as isotropic spacing.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        match values {
            [row, col, ..] => Some(Self::new(*row, *col)),
            [both] => Some(Self::new(*both, *both)),
            [] => None,
        }
    }

    /// Parses pixel spacing from its textual form
    ///
    /// Accepts "0.5\\0.5", "0.5 0.5", "[0.5, 0.5]" and exponential notation.
    pub fn parse(s: &str) -> Result<Self> {
        static REGEX: OnceLock<Regex> = OnceLock::new();
        let re = REGEX.get_or_init(|| {
            Regex::new(r"[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?").expect("Failed to compile regex")
        });

        let values = re
            .find_iter(s)
            .map(|m| m.as_str().parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| DcmIndexError::InvalidValue(format!("PixelSpacing '{}': {}", s, e)))?;

        match values.as_slice() {
            [row, col, ..] => Ok(Self::new(*row, *col)),
            _ => Err(DcmIndexError::InvalidValue(format!(
                "Failed to parse PixelSpacing from '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for PixelSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} mm", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0.5\\0.5", 0.5, 0.5)]
    #[case("0.9375 0.9375", 0.9375, 0.9375)]
    #[case("[1.0, 2.0]", 1.0, 2.0)]
    #[case("1.5e-1\\1.5e-1", 0.15, 0.15)]
    fn test_parse(#[case] input: &str, #[case] row: f64, #[case] col: f64) {
        let ps = PixelSpacing::parse(input).unwrap();
        assert_eq!(ps.row, row);
        assert_eq!(ps.col, col);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(PixelSpacing::parse("invalid").is_err());
        assert!(PixelSpacing::parse("").is_err());
        assert!(PixelSpacing::parse("0.1").is_err());
    }

    #[test]
    fn test_from_values() {
        assert_eq!(
            PixelSpacing::from_values(&[0.8, 0.9]),
            Some(PixelSpacing::new(0.8, 0.9))
        );
        assert_eq!(
            PixelSpacing::from_values(&[1.2]),
            Some(PixelSpacing::new(1.2, 1.2))
        );
        assert_eq!(PixelSpacing::from_values(&[]), None);
    }
}
