use serde::{Deserialize, Serialize};
use std::fmt;

/// Components of a PN (person name) value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub name_prefix: Option<String>,
    pub name_suffix: Option<String>,
}

impl PersonName {
    /// Returns true when no component is set
    pub fn is_empty(&self) -> bool {
        self.family_name.is_none()
            && self.given_name.is_none()
            && self.middle_name.is_none()
            && self.name_prefix.is_none()
            && self.name_suffix.is_none()
    }

    /// Given and family names separated by a space
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.given_name.as_deref().unwrap_or_default(),
            self.family_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Re-encodes the name with `^` separators, dropping trailing empty components
    pub fn to_dicom(&self) -> String {
        let parts = [
            &self.family_name,
            &self.given_name,
            &self.middle_name,
            &self.name_prefix,
            &self.name_suffix,
        ];
        let mut encoded: Vec<&str> = parts
            .iter()
            .map(|p| p.as_deref().unwrap_or_default())
            .collect();
        while encoded.last().is_some_and(|p| p.is_empty()) {
            encoded.pop();
        }
        encoded.join("^")
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dicom())
    }
}
