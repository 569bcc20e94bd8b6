use super::lookup::{parse_i64, parse_u64, DateRange};
use super::{FilterSet, QueryParams};
use crate::error::Result;
use crate::models::Image;
use crate::store::Registry;

/// Filter over [`Image`] rows
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    pub id: Option<u64>,
    pub uid: Option<String>,
    pub series_id: Option<u64>,

    /// SeriesInstanceUID of the parent series
    pub series_uid: Option<String>,

    pub number: Option<i64>,
    pub date: DateRange,
    pub b_value: Option<i64>,
}

impl FilterSet<Image> for ImageFilter {
    fn from_query(query: &QueryParams) -> Result<Self> {
        Ok(Self {
            id: query.get_parsed("id", parse_u64)?,
            uid: query.get("uid").map(str::to_string),
            series_id: query.get_parsed("series_id", parse_u64)?,
            series_uid: query.get("series_uid").map(str::to_string),
            number: query.get_parsed("number", parse_i64)?,
            date: query.date_range("date")?,
            b_value: query.get_parsed("b_value", parse_i64)?,
        })
    }

    fn matches(&self, registry: &Registry, image: &Image) -> bool {
        let series_uid_matches = self.series_uid.as_deref().map_or(true, |uid| {
            registry
                .series
                .get(image.series_id)
                .is_some_and(|s| s.uid == uid)
        });

        self.id.map_or(true, |id| id == image.id)
            && self.uid.as_deref().map_or(true, |uid| uid == image.uid)
            && self.series_id.map_or(true, |id| id == image.series_id)
            && series_uid_matches
            && self
                .number
                .map_or(true, |n| image.number.map(i64::from) == Some(n))
            && self.date.matches(image.date)
            && self
                .b_value
                .map_or(true, |b| image.b_value.map(i64::from) == Some(b))
    }
}
