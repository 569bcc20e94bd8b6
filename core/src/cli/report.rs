use crate::models::{Image, Patient, Series, Study};
use std::fmt;

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("unknown")
}

fn number<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Text report for a single series and its parents
pub struct TextReport<'a> {
    series: &'a Series,
    study: Option<&'a Study>,
    patient: Option<&'a Patient>,
    images: usize,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(
        series: &'a Series,
        study: Option<&'a Study>,
        patient: Option<&'a Patient>,
        images: usize,
    ) -> Self {
        Self {
            series,
            study,
            patient,
            images,
        }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.series;
        writeln!(f, "Series #{}", s.id)?;
        writeln!(f, "==========")?;
        writeln!(f)?;
        writeln!(f, "UID:            {}", s.uid)?;
        writeln!(f, "Number:         {}", number(s.number))?;
        writeln!(f, "Description:    {}", or_unknown(s.description.as_deref()))?;
        writeln!(f, "Protocol:       {}", or_unknown(s.protocol_name.as_deref()))?;
        writeln!(f, "Modality:       {}", or_unknown(s.modality.map(|m| m.code())))?;
        writeln!(f, "Date:           {}", number(s.date))?;
        writeln!(f, "Time:           {}", number(s.time))?;
        writeln!(f, "Images:         {}", self.images)?;
        writeln!(f)?;

        writeln!(f, "Acquisition")?;
        writeln!(f, "-----------")?;
        writeln!(f, "Sequence Type:  {}", s.sequence_type_label())?;
        writeln!(f, "Scanning Seq.:  {}", s.scanning_sequence_codes().join("\\"))?;
        writeln!(f, "Seq. Variant:   {}", s.sequence_variant_codes().join("\\"))?;
        writeln!(f, "Pulse Sequence: {}", or_unknown(s.pulse_sequence_name.as_deref()))?;
        writeln!(f, "Echo Time:      {}", number(s.echo_time))?;
        writeln!(f, "Repetition:     {}", number(s.repetition_time))?;
        writeln!(f, "Inversion:      {}", number(s.inversion_time))?;
        writeln!(f, "Flip Angle:     {}", number(s.flip_angle))?;
        writeln!(f, "Pixel Spacing:  {}", number(s.pixel_spacing))?;
        writeln!(f, "Slice Thick.:   {}", number(s.slice_thickness))?;
        writeln!(f, "Manufacturer:   {}", or_unknown(s.manufacturer.as_deref()))?;
        writeln!(f, "Field Strength: {}", number(s.magnetic_field_strength))?;
        writeln!(f)?;

        writeln!(f, "Hierarchy")?;
        writeln!(f, "---------")?;
        match self.study {
            Some(study) => writeln!(
                f,
                "Study:          {} ({})",
                study.uid,
                or_unknown(study.description.as_deref())
            )?,
            None => writeln!(f, "Study:          unknown")?,
        }
        match self.patient {
            Some(patient) => writeln!(f, "Patient:        {} ({})", patient.uid, patient.full_name())?,
            None => writeln!(f, "Patient:        unknown")?,
        }

        Ok(())
    }
}

/// One line per row in list output
pub fn patient_line(p: &Patient) -> String {
    format!(
        "{:>5}  {:<16}  {:<24}  {:<2}  {}",
        p.id,
        p.uid,
        p.full_name(),
        p.sex.map_or("-", |s| s.code()),
        number(p.date_of_birth)
    )
}

pub fn study_line(s: &Study) -> String {
    format!(
        "{:>5}  {:<40}  {}  {}",
        s.id,
        s.uid,
        number(s.date),
        s.description.as_deref().unwrap_or("")
    )
}

pub fn series_line(s: &Series) -> String {
    format!(
        "{:>5}  {:>3}  {:<32}  {:<12}  {}",
        s.id,
        number(s.number),
        s.description.as_deref().unwrap_or(""),
        s.sequence_type_label(),
        s.uid
    )
}

pub fn image_line(i: &Image) -> String {
    format!(
        "{:>5}  {:>4}  {:<40}  {}",
        i.id,
        number(i.number),
        i.uid,
        i.path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::tests::mr_object;
    use crate::header::Header;
    use crate::models::ParsedImage;
    use std::path::Path;

    #[test]
    fn test_text_report_format() {
        let header = Header::from_object(mr_object("P1", "1.1", "1.1.1", "1.1.1.1"));
        let parsed = ParsedImage::from_header(&header, Path::new("x.dcm")).unwrap();

        let report = TextReport::new(&parsed.series, Some(&parsed.study), Some(&parsed.patient), 2);
        let output = format!("{}", report);

        assert!(output.contains("UID:            1.1.1"));
        assert!(output.contains("Description:    t1_mprage_sag"));
        assert!(output.contains("Modality:       MR"));
        assert!(output.contains("Images:         2"));
        assert!(output.contains("Scanning Seq.:  GR\\IR"));
        assert!(output.contains("Echo Time:      2.98"));
        assert!(output.contains("Study:          1.1 (Head^Routine)"));
        assert!(output.contains("Patient:        P1 (John Doe)"));
    }

    #[test]
    fn test_missing_values() {
        let series = Series::new("1.2.3");
        let output = TextReport::new(&series, None, None, 0).to_string();
        assert!(output.contains("Number:         -"));
        assert!(output.contains("Manufacturer:   unknown"));
        assert!(output.contains("Sequence Type:  Unknown"));
        assert!(output.contains("Patient:        unknown"));
    }
}
