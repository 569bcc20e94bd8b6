use super::lookup::{parse_u64, DateRange, TextLookup};
use super::{FilterSet, QueryParams};
use crate::error::{DcmIndexError, Result};
use crate::models::Patient;
use crate::store::Registry;
use crate::types::Sex;

/// Filter over [`Patient`] rows
#[derive(Debug, Clone, Default)]
pub struct PatientFilter {
    pub id: Option<u64>,
    pub uid: Option<String>,
    pub sex: Option<Sex>,

    /// Date of birth, from `born_after` / `born_before`
    pub born: DateRange,

    /// Case-insensitive containment
    pub given_name: Option<String>,
    /// Case-insensitive containment
    pub family_name: Option<String>,
}

impl FilterSet<Patient> for PatientFilter {
    fn from_query(query: &QueryParams) -> Result<Self> {
        let sex = query
            .get("sex")
            .map(|code| {
                Sex::from_code(code).ok_or_else(|| {
                    DcmIndexError::FilterError(format!("sex: '{}' is not a valid choice", code))
                })
            })
            .transpose()?;

        Ok(Self {
            id: query.get_parsed("id", parse_u64)?,
            uid: query.get("uid").map(str::to_string),
            sex,
            born: query.date_range("born")?,
            given_name: query.get("given_name").map(str::to_string),
            family_name: query.get("family_name").map(str::to_string),
        })
    }

    fn matches(&self, _registry: &Registry, patient: &Patient) -> bool {
        let name_matches = |expected: &Option<String>, value: Option<&str>| {
            expected
                .as_ref()
                .map_or(true, |e| TextLookup::icontains(e.as_str()).matches(value))
        };

        self.id.map_or(true, |id| id == patient.id)
            && self.uid.as_deref().map_or(true, |uid| uid == patient.uid)
            && self.sex.map_or(true, |sex| patient.sex == Some(sex))
            && self.born.matches(patient.date_of_birth)
            && name_matches(&self.given_name, patient.given_name.as_deref())
            && name_matches(&self.family_name, patient.family_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_patient_filter() {
        let registry = Registry::new();
        let mut doe = Patient::new("P1");
        doe.id = 1;
        doe.sex = Some(Sex::Male);
        doe.family_name = Some("Doe".to_string());
        doe.given_name = Some("John".to_string());
        doe.date_of_birth = NaiveDate::from_ymd_opt(1985, 4, 12);

        let mut smith = Patient::new("P2");
        smith.id = 2;
        smith.sex = Some(Sex::Female);
        smith.family_name = Some("Smith".to_string());

        let patients = vec![doe, smith];
        let run = |query: &str| -> Vec<u64> {
            let filter = PatientFilter::from_query(&QueryParams::parse(query).unwrap()).unwrap();
            filter.apply(&registry, &patients).iter().map(|p| p.id).collect()
        };

        assert_eq!(run("sex=F"), vec![2]);
        assert_eq!(run("family_name=DO"), vec![1]);
        assert_eq!(run("given_name=jo"), vec![1]);
        assert_eq!(run("born_after=1980-01-01"), vec![1]);
        assert_eq!(run("born_before=1980-01-01"), Vec::<u64>::new());
        assert_eq!(run("uid=P2"), vec![2]);
        assert!(PatientFilter::from_query(&QueryParams::parse("sex=X").unwrap()).is_err());
    }
}
