use serde::{Deserialize, Serialize};
use std::fmt;

/// Patient sex as encoded in the PatientSex code string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Sex {
    /// Returns the DICOM code string
    pub fn code(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Other => "O",
        }
    }

    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Other => "other",
        }
    }

    /// Parses a PatientSex value, `None` for empty or unrecognized codes
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "M" | "MALE" => Some(Sex::Male),
            "F" | "FEMALE" => Some(Sex::Female),
            "O" | "OTHER" => Some(Sex::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Acquisition modality (subset of the defined terms for Modality)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Cr,
    Ct,
    Dx,
    Mg,
    Mr,
    Nm,
    Ot,
    Pr,
    Pt,
    Rf,
    Sr,
    Us,
    Xa,
    Unknown,
}

impl Modality {
    /// Returns whether this modality is unknown
    pub fn is_unknown(&self) -> bool {
        matches!(self, Modality::Unknown)
    }

    /// Returns the DICOM code string
    pub fn code(&self) -> &'static str {
        match self {
            Modality::Cr => "CR",
            Modality::Ct => "CT",
            Modality::Dx => "DX",
            Modality::Mg => "MG",
            Modality::Mr => "MR",
            Modality::Nm => "NM",
            Modality::Ot => "OT",
            Modality::Pr => "PR",
            Modality::Pt => "PT",
            Modality::Rf => "RF",
            Modality::Sr => "SR",
            Modality::Us => "US",
            Modality::Xa => "XA",
            Modality::Unknown => "",
        }
    }

    /// Returns a human readable description
    pub fn description(&self) -> &'static str {
        match self {
            Modality::Cr => "Computed Radiography",
            Modality::Ct => "Computed Tomography",
            Modality::Dx => "Digital Radiography",
            Modality::Mg => "Mammography",
            Modality::Mr => "Magnetic Resonance",
            Modality::Nm => "Nuclear Medicine",
            Modality::Ot => "Other",
            Modality::Pr => "Presentation State",
            Modality::Pt => "Positron emission tomography (PET)",
            Modality::Rf => "Radio Fluoroscopy",
            Modality::Sr => "SR Document",
            Modality::Us => "Ultrasound",
            Modality::Xa => "X-Ray Angiography",
            Modality::Unknown => "Unknown",
        }
    }

    /// Parses modality from its code string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "CR" => Modality::Cr,
            "CT" => Modality::Ct,
            "DX" => Modality::Dx,
            "MG" => Modality::Mg,
            "MR" => Modality::Mr,
            "NM" => Modality::Nm,
            "OT" => Modality::Ot,
            "PR" => Modality::Pr,
            "PT" => Modality::Pt,
            "RF" => Modality::Rf,
            "SR" => Modality::Sr,
            "US" => Modality::Us,
            "XA" => Modality::Xa,
            _ => Modality::Unknown,
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Scanning sequence code (ScanningSequence attribute, MR only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanningSequence {
    /// Spin Echo
    Se,
    /// Inversion Recovery
    Ir,
    /// Gradient Recalled
    Gr,
    /// Echo Planar
    Ep,
    /// Research Mode
    Rm,
}

impl ScanningSequence {
    /// Maximal number of values the attribute may hold
    pub const MAX_VALUES: usize = 5;

    pub const ALL: [ScanningSequence; 5] = [
        ScanningSequence::Se,
        ScanningSequence::Ir,
        ScanningSequence::Gr,
        ScanningSequence::Ep,
        ScanningSequence::Rm,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ScanningSequence::Se => "SE",
            ScanningSequence::Ir => "IR",
            ScanningSequence::Gr => "GR",
            ScanningSequence::Ep => "EP",
            ScanningSequence::Rm => "RM",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScanningSequence::Se => "Spin Echo",
            ScanningSequence::Ir => "Inversion Recovery",
            ScanningSequence::Gr => "Gradient Recalled",
            ScanningSequence::Ep => "Echo Planar",
            ScanningSequence::Rm => "Research Mode",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.code().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for ScanningSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Sequence variant code (SequenceVariant attribute, MR only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SequenceVariant {
    /// Segmented k-Space
    Sk,
    /// Magnetization Transfer Contrast
    Mtc,
    /// Steady State
    Ss,
    /// Time Reversed Steady State
    Trss,
    /// Spoiled
    Sp,
    /// MAG Prepared
    Mp,
    /// Oversampling Phase
    Osp,
    /// No sequence variant
    None,
}

impl SequenceVariant {
    /// Maximal number of values the attribute may hold
    pub const MAX_VALUES: usize = 6;

    pub const ALL: [SequenceVariant; 8] = [
        SequenceVariant::Sk,
        SequenceVariant::Mtc,
        SequenceVariant::Ss,
        SequenceVariant::Trss,
        SequenceVariant::Sp,
        SequenceVariant::Mp,
        SequenceVariant::Osp,
        SequenceVariant::None,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            SequenceVariant::Sk => "SK",
            SequenceVariant::Mtc => "MTC",
            SequenceVariant::Ss => "SS",
            SequenceVariant::Trss => "TRSS",
            SequenceVariant::Sp => "SP",
            SequenceVariant::Mp => "MP",
            SequenceVariant::Osp => "OSP",
            SequenceVariant::None => "NONE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SequenceVariant::Sk => "Segmented k-Space",
            SequenceVariant::Mtc => "Magnetization Transfer Contrast",
            SequenceVariant::Ss => "Steady State",
            SequenceVariant::Trss => "Time Reversed Steady State",
            SequenceVariant::Sp => "Spoiled",
            SequenceVariant::Mp => "MAG Prepared",
            SequenceVariant::Osp => "Oversampling Phase",
            SequenceVariant::None => "None",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.code().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for SequenceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
