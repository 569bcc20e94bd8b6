use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad grouping of detected sequence types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceCategory {
    Anatomical,
    Diffusion,
    Functional,
    Physiological,
}

impl fmt::Display for SequenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SequenceCategory::Anatomical => "Anatomical",
            SequenceCategory::Diffusion => "Diffusion",
            SequenceCategory::Functional => "Functional",
            SequenceCategory::Physiological => "Physiological",
        };
        write!(f, "{}", name)
    }
}

/// MRI sequence type of a series
///
/// An undetected series carries `Option::<SequenceType>::None`, shown as "Unknown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceType {
    Localizer,
    Flair,
    IrEpi,
    Mprage,
    T2w,
    Dwi,
    DwiDerived,
    DwiFieldmap,
    DwiSbref,
    Bold,
    FuncFieldmap,
    FuncSbref,
    PhysioLog,
}

impl SequenceType {
    pub const ALL: [SequenceType; 13] = [
        SequenceType::Localizer,
        SequenceType::Flair,
        SequenceType::IrEpi,
        SequenceType::Mprage,
        SequenceType::T2w,
        SequenceType::Dwi,
        SequenceType::DwiDerived,
        SequenceType::DwiFieldmap,
        SequenceType::DwiSbref,
        SequenceType::Bold,
        SequenceType::FuncFieldmap,
        SequenceType::FuncSbref,
        SequenceType::PhysioLog,
    ];

    /// Stored value, as used in filters and JSON
    pub fn key(&self) -> &'static str {
        match self {
            SequenceType::Localizer => "localizer",
            SequenceType::Flair => "flair",
            SequenceType::IrEpi => "ir_epi",
            SequenceType::Mprage => "mprage",
            SequenceType::T2w => "t2w",
            SequenceType::Dwi => "dwi",
            SequenceType::DwiDerived => "dwi_derived",
            SequenceType::DwiFieldmap => "dwi_fieldmap",
            SequenceType::DwiSbref => "dwi_sbref",
            SequenceType::Bold => "bold",
            SequenceType::FuncFieldmap => "func_fieldmap",
            SequenceType::FuncSbref => "func_sbref",
            SequenceType::PhysioLog => "physio_log",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            SequenceType::Localizer => "Localizer",
            SequenceType::Flair => "FLAIR",
            SequenceType::IrEpi => "IR-EPI",
            SequenceType::Mprage => "MPRAGE",
            SequenceType::T2w => "T2-weighted",
            SequenceType::Dwi => "DWI",
            SequenceType::DwiDerived => "DWI (derived)",
            SequenceType::DwiFieldmap => "DWI Fieldmap",
            SequenceType::DwiSbref => "DWI SBRef",
            SequenceType::Bold => "fMRI",
            SequenceType::FuncFieldmap => "fMRI Fieldmap",
            SequenceType::FuncSbref => "fMRI SBRef",
            SequenceType::PhysioLog => "Physio Log",
        }
    }

    pub fn category(&self) -> SequenceCategory {
        match self {
            SequenceType::Localizer
            | SequenceType::Flair
            | SequenceType::IrEpi
            | SequenceType::Mprage
            | SequenceType::T2w => SequenceCategory::Anatomical,
            SequenceType::Dwi
            | SequenceType::DwiDerived
            | SequenceType::DwiFieldmap
            | SequenceType::DwiSbref => SequenceCategory::Diffusion,
            SequenceType::Bold | SequenceType::FuncFieldmap | SequenceType::FuncSbref => {
                SequenceCategory::Functional
            }
            SequenceType::PhysioLog => SequenceCategory::Physiological,
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.iter().copied().find(|t| t.key() == s)
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
