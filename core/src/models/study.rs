use super::DicomEntity;
use crate::error::{DcmIndexError, Result};
use crate::extraction::{get_date_value, get_string_value, get_time_value};
use crate::extraction::{STUDY_DATE, STUDY_DESCRIPTION, STUDY_INSTANCE_UID, STUDY_TIME};
use crate::header::Header;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A study, identified by StudyInstanceUID
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: u64,
    pub uid: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl Study {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn from_header(header: &Header) -> Result<Self> {
        let uid = get_string_value(header.object(), STUDY_INSTANCE_UID)
            .ok_or(DcmIndexError::MissingAttribute("StudyInstanceUID"))?;
        let mut study = Self::new(uid);
        study.update_fields_from_header(header);
        Ok(study)
    }
}

impl DicomEntity for Study {
    const NAME: &'static str = "study";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn uid(&self) -> &str {
        &self.uid
    }

    fn update_fields_from_header(&mut self, header: &Header) {
        let dcm = header.object();
        self.description = get_string_value(dcm, STUDY_DESCRIPTION);
        self.date = get_date_value(dcm, STUDY_DATE);
        self.time = get_time_value(dcm, STUDY_TIME);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::tests::mr_object;

    #[test]
    fn test_from_header() {
        let header = Header::from_object(mr_object("P1", "1.2", "1.2.3", "1.2.3.4"));
        let study = Study::from_header(&header).unwrap();
        assert_eq!(study.uid, "1.2");
        assert_eq!(study.description.as_deref(), Some("Head^Routine"));
        assert_eq!(study.date, NaiveDate::from_ymd_opt(2021, 11, 23));
        assert_eq!(study.time, NaiveTime::from_hms_opt(17, 42, 0));
    }
}
