//! Page-number pagination for list endpoints

use crate::config::MAX_PAGE_SIZE;
use crate::error::{DcmIndexError, Result};
use crate::filters::QueryParams;
use serde::Serialize;

pub const PAGE_PARAM: &str = "page";
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// One page of a list response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResponse<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> PaginatedResponse<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Requested page (1-based) and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    /// Reads `page` and `page_size`, capping the size at [`MAX_PAGE_SIZE`]
    pub fn from_query(query: &QueryParams, default_size: usize) -> Result<Self> {
        let parse = |key: &str, default: usize| -> Result<usize> {
            match query.get(key) {
                None => Ok(default),
                Some(v) => match v.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => Err(DcmIndexError::FilterError(format!(
                        "{}: '{}' is not a positive integer",
                        key, v
                    ))),
                },
            }
        };
        Ok(Self {
            page: parse(PAGE_PARAM, 1)?,
            page_size: parse(PAGE_SIZE_PARAM, default_size)?.min(MAX_PAGE_SIZE),
        })
    }
}

/// Link to `page`, keeping every other parameter of the request
fn page_link(path: &str, query: &[(String, String)], page: usize) -> String {
    let mut pairs: Vec<(&str, String)> = query
        .iter()
        .filter(|(k, _)| k != PAGE_PARAM)
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();
    pairs.push((PAGE_PARAM, page.to_string()));
    match serde_urlencoded::to_string(&pairs) {
        Ok(encoded) => format!("{}?{}", path, encoded),
        Err(_) => format!("{}?{}={}", path, PAGE_PARAM, page),
    }
}

/// Slices `items` into the requested page
///
/// # Errors
///
/// A page past the last one is an error, except page 1 of an empty list.
pub fn paginate<T>(
    items: Vec<T>,
    request: PageRequest,
    path: &str,
    query: &[(String, String)],
) -> Result<PaginatedResponse<T>> {
    let count = items.len();
    let pages = count.div_ceil(request.page_size).max(1);
    if request.page > pages {
        return Err(DcmIndexError::FilterError(format!(
            "page {} is out of range (last page is {})",
            request.page, pages
        )));
    }

    let start = (request.page - 1) * request.page_size;
    let results = items
        .into_iter()
        .skip(start)
        .take(request.page_size)
        .collect();

    Ok(PaginatedResponse {
        count,
        next: (request.page < pages).then(|| page_link(path, query, request.page + 1)),
        previous: (request.page > 1).then(|| page_link(path, query, request.page - 1)),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_page_request() {
        let query = QueryParams::parse("page=2&page_size=5000").unwrap();
        let request = PageRequest::from_query(&query, 100).unwrap();
        assert_eq!(request, PageRequest { page: 2, page_size: MAX_PAGE_SIZE });

        let defaults = PageRequest::from_query(&QueryParams::default(), 100).unwrap();
        assert_eq!(defaults, PageRequest { page: 1, page_size: 100 });

        assert!(PageRequest::from_query(&QueryParams::parse("page=0").unwrap(), 100).is_err());
        assert!(PageRequest::from_query(&QueryParams::parse("page=x").unwrap(), 100).is_err());
    }

    #[test]
    fn test_paginate_links() {
        let query = pairs(&[("modality", "MR"), ("page", "2"), ("page_size", "2")]);
        let page = paginate(
            (1..=5).collect(),
            PageRequest { page: 2, page_size: 2 },
            "/dicom/series/",
            &query,
        )
        .unwrap();
        assert_eq!(page.count, 5);
        assert_eq!(page.results, vec![3, 4]);
        assert_eq!(
            page.next.as_deref(),
            Some("/dicom/series/?modality=MR&page_size=2&page=3")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("/dicom/series/?modality=MR&page_size=2&page=1")
        );
    }

    #[test]
    fn test_paginate_bounds() {
        let empty = paginate(Vec::<u8>::new(), PageRequest { page: 1, page_size: 10 }, "/x/", &[]).unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.next.is_none() && empty.previous.is_none());

        assert!(paginate(vec![1, 2], PageRequest { page: 2, page_size: 10 }, "/x/", &[]).is_err());
    }
}
