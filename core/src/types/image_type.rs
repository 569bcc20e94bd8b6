use serde::{Deserialize, Serialize};
use std::fmt;

/// DICOM ImageType attribute split into its value positions
///
/// - `pixels`: value 1, pixel data characteristics ("ORIGINAL" or "DERIVED")
/// - `exam`: value 2, patient examination characteristics ("PRIMARY" or "SECONDARY")
/// - `specifics`: values 3 and beyond (e.g. "M", "ND", "DIFFUSION", "MOSAIC")
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageType {
    pub pixels: String,
    pub exam: String,
    pub specifics: Vec<String>,
}

impl ImageType {
    /// Creates an ImageType from the attribute's values in order
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Self {
        let mut iter = values.iter().map(|v| v.as_ref().trim().to_uppercase());
        let pixels = iter.next().unwrap_or_default();
        let exam = iter.next().unwrap_or_default();
        Self {
            pixels,
            exam,
            specifics: iter.collect(),
        }
    }

    /// Returns true for "ORIGINAL" pixel data
    pub fn is_original(&self) -> bool {
        self.pixels == "ORIGINAL"
    }

    /// Returns true for "DERIVED" pixel data
    pub fn is_derived(&self) -> bool {
        self.pixels == "DERIVED"
    }

    /// Checks if any position holds the value (case-insensitive)
    pub fn contains(&self, val: &str) -> bool {
        let val = val.to_uppercase();
        self.pixels == val || self.exam == val || self.specifics.iter().any(|x| *x == val)
    }

    /// Checks if any position holds one of the values
    pub fn contains_any(&self, vals: &[&str]) -> bool {
        vals.iter().any(|v| self.contains(v))
    }

    /// Returns true if both pixels and exam are non-empty
    pub fn is_valid(&self) -> bool {
        !self.pixels.is_empty() && !self.exam.is_empty()
    }

    /// Returns the values in attribute order
    pub fn values(&self) -> Vec<String> {
        let mut values = vec![self.pixels.clone(), self.exam.clone()];
        values.extend(self.specifics.iter().cloned());
        values
    }

    /// Returns a backslash-joined representation, as stored in the header
    ///
    /// Empty positions are kept so that value positions stay stable.
    pub fn simple_repr(&self) -> String {
        self.values().join("\\")
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_repr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values_basic() {
        let img_type = ImageType::from_values(&["ORIGINAL", "PRIMARY", "M", "ND"]);
        assert_eq!(img_type.pixels, "ORIGINAL");
        assert_eq!(img_type.exam, "PRIMARY");
        assert_eq!(img_type.specifics, vec!["M", "ND"]);
        assert_eq!(img_type.simple_repr(), "ORIGINAL\\PRIMARY\\M\\ND");
    }

    #[test]
    fn test_from_values_normalizes_case() {
        let img_type = ImageType::from_values(&["derived", " primary ", "adc"]);
        assert!(img_type.is_derived());
        assert!(img_type.contains("ADC"));
        assert!(img_type.contains("adc"));
    }

    #[test]
    fn test_contains_any() {
        let img_type = ImageType::from_values(&["ORIGINAL", "PRIMARY", "DIFFUSION", "NONE"]);
        assert!(img_type.contains_any(&["TRACEW", "DIFFUSION"]));
        assert!(!img_type.contains_any(&["FMRI", "PHYSIO"]));
    }

    #[test]
    fn test_is_valid() {
        assert!(ImageType::from_values(&["ORIGINAL", "PRIMARY"]).is_valid());
        assert!(!ImageType::from_values(&["ORIGINAL"]).is_valid());
        let empty: [&str; 0] = [];
        assert!(!ImageType::from_values(&empty).is_valid());
    }
}
