use crate::types::{ImageType, Modality, ScanningSequence, SequenceType, SequenceVariant};
use dicom_object::InMemDicomObject;

use super::tags::{
    get_float_value, get_multi_string_value, get_string_value, IMAGE_TYPE, INVERSION_TIME,
    MODALITY, PROTOCOL_NAME, SCANNING_SEQUENCE, SEQUENCE_VARIANT, SERIES_DESCRIPTION,
};

const LOCALIZER_MARKERS: &[&str] = &["localizer", "scout", "aahead"];
const DIFFUSION_MARKERS: &[&str] = &["dwi", "dmri", "dti", "diff"];
const FIELDMAP_MARKERS: &[&str] = &["fmap", "fieldmap", "field_map"];
const SBREF_MARKERS: &[&str] = &["sbref"];
const DERIVED_DIFFUSION_MAPS: &[&str] = &["ADC", "TRACEW", "FA", "DIFFUSION"];

/// Header attributes that determine the sequence type of a series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceSignature {
    pub modality: Option<Modality>,
    pub scanning_sequence: Vec<ScanningSequence>,
    pub sequence_variant: Vec<SequenceVariant>,
    pub image_type: ImageType,
    pub series_description: String,
    pub protocol_name: String,
    pub inversion_time: Option<f64>,
}

impl SequenceSignature {
    /// Collects the signature from a DICOM header
    pub fn from_dicom(dcm: &InMemDicomObject) -> Self {
        let codes = |tag| get_multi_string_value(dcm, tag).unwrap_or_default();
        Self {
            modality: get_string_value(dcm, MODALITY).map(|m| Modality::from_str(&m)),
            scanning_sequence: codes(SCANNING_SEQUENCE)
                .iter()
                .filter_map(|c| ScanningSequence::from_code(c))
                .collect(),
            sequence_variant: codes(SEQUENCE_VARIANT)
                .iter()
                .filter_map(|c| SequenceVariant::from_code(c))
                .collect(),
            image_type: ImageType::from_values(&codes(IMAGE_TYPE)),
            series_description: get_string_value(dcm, SERIES_DESCRIPTION).unwrap_or_default(),
            protocol_name: get_string_value(dcm, PROTOCOL_NAME).unwrap_or_default(),
            inversion_time: get_float_value(dcm, INVERSION_TIME),
        }
    }

    fn has_scan(&self, code: ScanningSequence) -> bool {
        self.scanning_sequence.contains(&code)
    }

    fn has_variant(&self, code: SequenceVariant) -> bool {
        self.sequence_variant.contains(&code)
    }

    /// Lowercased description and protocol name, for marker matching
    fn text(&self) -> String {
        format!("{} {}", self.series_description, self.protocol_name).to_lowercase()
    }
}

fn mentions(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

/// Detects the MRI sequence type of a series
///
/// # Algorithm
///
/// Rules are tried in order and the first match wins:
/// 1. ImageType contains PHYSIO → physio_log
/// 2. Localizer markers in description/protocol → localizer
/// 3. DERIVED ImageType with a diffusion map value → dwi_derived
/// 4. EP with diffusion markers or DIFFUSION ImageType → dwi_sbref / dwi_fieldmap / dwi
/// 5. EP + IR → ir_epi
/// 6. EP → func_sbref / func_fieldmap / bold
/// 7. GR + IR with MP variant → mprage
/// 8. SE + IR → flair
/// 9. SE only with SK variant → t2w
///
/// Returns `None` (Unknown) for non-MR data and when no rule applies.
pub fn detect_sequence_type(sig: &SequenceSignature) -> Option<SequenceType> {
    if sig.modality.is_some_and(|m| m != Modality::Mr) {
        return None;
    }

    let text = sig.text();
    let image_type = &sig.image_type;

    if image_type.contains("PHYSIO") {
        return Some(SequenceType::PhysioLog);
    }

    if mentions(&text, LOCALIZER_MARKERS) {
        return Some(SequenceType::Localizer);
    }

    if image_type.is_derived() && image_type.contains_any(DERIVED_DIFFUSION_MAPS) {
        return Some(SequenceType::DwiDerived);
    }

    let echo_planar = sig.has_scan(ScanningSequence::Ep);
    let inversion = sig.has_scan(ScanningSequence::Ir);

    if echo_planar && (mentions(&text, DIFFUSION_MARKERS) || image_type.contains("DIFFUSION")) {
        return Some(if mentions(&text, SBREF_MARKERS) {
            SequenceType::DwiSbref
        } else if mentions(&text, FIELDMAP_MARKERS) {
            SequenceType::DwiFieldmap
        } else {
            SequenceType::Dwi
        });
    }

    if echo_planar && inversion {
        return Some(SequenceType::IrEpi);
    }

    if echo_planar {
        return Some(if mentions(&text, SBREF_MARKERS) {
            SequenceType::FuncSbref
        } else if mentions(&text, FIELDMAP_MARKERS) {
            SequenceType::FuncFieldmap
        } else {
            SequenceType::Bold
        });
    }

    if sig.has_scan(ScanningSequence::Gr) && inversion && sig.has_variant(SequenceVariant::Mp) {
        return Some(SequenceType::Mprage);
    }

    if sig.has_scan(ScanningSequence::Se) && inversion {
        return Some(SequenceType::Flair);
    }

    if sig.scanning_sequence == [ScanningSequence::Se] && sig.has_variant(SequenceVariant::Sk) {
        return Some(SequenceType::T2w);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{DataElement, PrimitiveValue, VR};
    use rstest::rstest;
    use crate::types::ScanningSequence::{Ep, Gr, Ir, Rm, Se};
    use crate::types::SequenceVariant::{Mp, Osp, Sk, Sp, Ss};

    fn signature(
        scans: &[ScanningSequence],
        variants: &[SequenceVariant],
        image_type: &[&str],
        description: &str,
    ) -> SequenceSignature {
        SequenceSignature {
            modality: Some(Modality::Mr),
            scanning_sequence: scans.to_vec(),
            sequence_variant: variants.to_vec(),
            image_type: ImageType::from_values(image_type),
            series_description: description.to_string(),
            protocol_name: String::new(),
            inversion_time: None,
        }
    }

    #[rstest]
    #[case(&[Gr, Ir], &[Sk, Sp, Mp], &["ORIGINAL", "PRIMARY", "M", "ND"], "MPRAGE", Some(SequenceType::Mprage))]
    #[case(&[Se, Ir], &[Sk, Sp, Mp], &["ORIGINAL", "PRIMARY", "M", "ND"], "t2_flair", Some(SequenceType::Flair))]
    #[case(&[Se], &[Sk, Sp, Osp], &["ORIGINAL", "PRIMARY", "M", "ND"], "t2_tse", Some(SequenceType::T2w))]
    #[case(&[Ep, Ir], &[Sk, Sp], &["ORIGINAL", "PRIMARY", "M", "ND"], "IREPI", Some(SequenceType::IrEpi))]
    #[case(&[Gr], &[Sp], &["ORIGINAL", "PRIMARY", "M", "ND"], "localizer", Some(SequenceType::Localizer))]
    #[case(&[Ep], &[Sk, Sp], &["ORIGINAL", "PRIMARY", "DIFFUSION", "NONE"], "ep2d_diff", Some(SequenceType::Dwi))]
    #[case(&[Ep], &[Sk, Sp], &["ORIGINAL", "PRIMARY", "M", "ND"], "dMRI_SBRef", Some(SequenceType::DwiSbref))]
    #[case(&[Ep], &[Sk, Sp], &["ORIGINAL", "PRIMARY", "M", "ND"], "dwi_fieldmap_AP", Some(SequenceType::DwiFieldmap))]
    #[case(&[Ep], &[Sk, Sp], &["DERIVED", "PRIMARY", "DIFFUSION", "ADC"], "ep2d_diff_ADC", Some(SequenceType::DwiDerived))]
    #[case(&[Ep], &[Sk, Ss], &["ORIGINAL", "PRIMARY", "M", "MB", "ND", "MOSAIC"], "rsfMRI", Some(SequenceType::Bold))]
    #[case(&[Ep], &[Sk, Ss], &["ORIGINAL", "PRIMARY", "M", "ND"], "rsfMRI_SBRef", Some(SequenceType::FuncSbref))]
    #[case(&[Ep], &[Sk, Sp], &["ORIGINAL", "PRIMARY", "M", "ND"], "func_fieldmap_PA", Some(SequenceType::FuncFieldmap))]
    #[case(&[Rm], &[], &["ORIGINAL", "PRIMARY", "RAWDATA", "PHYSIO"], "PhysioLog", Some(SequenceType::PhysioLog))]
    #[case(&[Gr], &[Sp], &["ORIGINAL", "PRIMARY", "M", "ND"], "gre_field_mapping", None)]
    fn test_detection(
        #[case] scans: &[ScanningSequence],
        #[case] variants: &[SequenceVariant],
        #[case] image_type: &[&str],
        #[case] description: &str,
        #[case] expected: Option<SequenceType>,
    ) {
        let sig = signature(scans, variants, image_type, description);
        assert_eq!(detect_sequence_type(&sig), expected);
    }

    #[test]
    fn test_non_mr_is_unknown() {
        let mut sig = signature(&[Gr, Ir], &[Mp], &["ORIGINAL", "PRIMARY"], "MPRAGE");
        sig.modality = Some(Modality::Ct);
        assert_eq!(detect_sequence_type(&sig), None);
    }

    #[test]
    fn test_protocol_name_counts_as_text() {
        let mut sig = signature(&[Ep], &[Sk], &["ORIGINAL", "PRIMARY"], "");
        sig.protocol_name = "DTI_64dir".to_string();
        assert_eq!(detect_sequence_type(&sig), Some(SequenceType::Dwi));
    }

    #[test]
    fn test_signature_from_dicom() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(MODALITY, VR::CS, PrimitiveValue::from("MR")));
        dcm.put(DataElement::new(
            SCANNING_SEQUENCE,
            VR::CS,
            PrimitiveValue::Strs(vec!["GR".to_string(), "IR".to_string()].into()),
        ));
        dcm.put(DataElement::new(
            SEQUENCE_VARIANT,
            VR::CS,
            PrimitiveValue::Strs(vec!["SK".to_string(), "SP".to_string(), "MP".to_string()].into()),
        ));
        dcm.put(DataElement::new(
            IMAGE_TYPE,
            VR::CS,
            PrimitiveValue::Strs(vec!["ORIGINAL".to_string(), "PRIMARY".to_string()].into()),
        ));
        dcm.put(DataElement::new(INVERSION_TIME, VR::DS, PrimitiveValue::from("1000")));

        let sig = SequenceSignature::from_dicom(&dcm);
        assert_eq!(sig.modality, Some(Modality::Mr));
        assert_eq!(sig.scanning_sequence, vec![Gr, Ir]);
        assert_eq!(sig.sequence_variant, vec![Sk, Sp, Mp]);
        assert_eq!(sig.inversion_time, Some(1000.0));
        assert_eq!(detect_sequence_type(&sig), Some(SequenceType::Mprage));
    }
}
