use super::lookup::{parse_u64, DateRange, Lookup, TextLookup};
use super::{FilterSet, QueryParams};
use crate::error::Result;
use crate::models::Study;
use crate::store::Registry;

/// Filter over [`Study`] rows: `id`, `uid`, `description` (+ lookup),
/// `date_after`, `date_before`
#[derive(Debug, Clone, Default)]
pub struct StudyFilter {
    pub id: Option<u64>,
    pub uid: Option<String>,
    pub description: Option<TextLookup>,
    pub date: DateRange,
}

impl FilterSet<Study> for StudyFilter {
    fn from_query(query: &QueryParams) -> Result<Self> {
        Ok(Self {
            id: query.get_parsed("id", parse_u64)?,
            uid: query.get("uid").map(str::to_string),
            description: query.text_lookup("description", Lookup::Exact)?,
            date: query.date_range("date")?,
        })
    }

    fn matches(&self, _registry: &Registry, study: &Study) -> bool {
        self.id.map_or(true, |id| id == study.id)
            && self.uid.as_deref().map_or(true, |uid| uid == study.uid)
            && self
                .description
                .as_ref()
                .map_or(true, |d| d.matches(study.description.as_deref()))
            && self.date.matches(study.date)
    }
}
