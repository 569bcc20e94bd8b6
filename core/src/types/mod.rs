//! Core type definitions for DICOM metadata
//!
//! This module provides the value types shared by the models, filters and API:
//! - [`Sex`], [`Modality`], [`ScanningSequence`], [`SequenceVariant`]: code strings
//! - [`SequenceType`]: detected MRI sequence type and its [`SequenceCategory`]
//! - [`ImageType`]: decomposed DICOM ImageType field
//! - [`PixelSpacing`]: in-plane pixel spacing
//! - [`PersonName`]: components of a PN value

mod enums;
mod image_type;
mod person_name;
mod pixel_spacing;
mod sequence_type;

pub use enums::{Modality, ScanningSequence, SequenceVariant, Sex};
pub use image_type::ImageType;
pub use person_name::PersonName;
pub use pixel_spacing::PixelSpacing;
pub use sequence_type::{SequenceCategory, SequenceType};
