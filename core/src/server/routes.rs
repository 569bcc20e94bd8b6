//! Request routing
//!
//! | Path                                   | Body                         |
//! |----------------------------------------|------------------------------|
//! | `/dicom/`                              | endpoint index               |
//! | `/dicom/{kind}/`                       | filtered, paginated list     |
//! | `/dicom/{kind}/{id}/`                  | detail                       |
//! | `/dicom/image/{id}/header/`            | header snapshot              |
//! | `/dicom/patient/download/{uid}/`       | file set of a patient        |
//! | `/admin/`                              | counts and storage settings  |
//!
//! The trailing slash is optional. Segments are percent-decoded before
//! matching, so `/dicom/patient/download/ANON%2001/` names `ANON 01`.

use super::pagination::{paginate, PageRequest};
use super::serializers;
use super::{ApiResponse, AppState};
use crate::error::{DcmIndexError, Result};
use crate::filters::{FilterSet, ImageFilter, PatientFilter, QueryParams, SeriesFilter, StudyFilter};
use crate::models::{Image, Patient, Series, Study};
use crate::store::{Registry, SCHEMA_VERSION};
use hyper::{Method, StatusCode};
use log::error;
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::collections::BTreeMap;

const KINDS: [&str; 4] = ["patient", "study", "series", "image"];

/// Handles one request against the shared state
pub fn route(state: &AppState, method: &Method, path: &str, query: &str) -> ApiResponse {
    if method != Method::GET {
        return ApiResponse::detail(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Method \"{}\" not allowed.", method),
        );
    }

    let decoded = match decode_segments(path) {
        Some(decoded) => decoded,
        None => return ApiResponse::detail(StatusCode::BAD_REQUEST, "Malformed path."),
    };
    let segments: Vec<&str> = decoded.iter().map(|s| s.as_ref()).collect();
    let registry = state.registry.read();

    let result = match segments.as_slice() {
        ["dicom"] => Ok(index()),
        ["admin"] => Ok(admin(state, &registry)),
        ["dicom", kind] => QueryParams::parse(query)
            .and_then(|params| list(state, &registry, kind, &params)),
        ["dicom", "patient", "download", uid] => download(state, &registry, uid),
        ["dicom", "image", id, "header"] => parse_id(id)
            .and_then(|id| registry.get_image(id))
            .map(serializers::image_header),
        ["dicom", kind, id] => detail(&registry, kind, id),
        _ => return ApiResponse::not_found(),
    };

    match result {
        Ok(body) => ApiResponse::ok(body),
        Err(DcmIndexError::FilterError(message)) => {
            ApiResponse::detail(StatusCode::BAD_REQUEST, message)
        }
        Err(DcmIndexError::NotFound { .. }) => ApiResponse::not_found(),
        Err(e) => {
            error!("{} {}: {}", method, path, e);
            ApiResponse::detail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Non-empty path segments, percent-decoded; `None` when a segment is not UTF-8
fn decode_segments(path: &str) -> Option<Vec<Cow<'_, str>>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| percent_decode_str(s).decode_utf8().ok())
        .collect()
}

fn index() -> Value {
    Value::Object(
        KINDS
            .iter()
            .map(|kind| (kind.to_string(), json!(format!("/dicom/{}/", kind))))
            .collect(),
    )
}

fn admin(state: &AppState, registry: &Registry) -> Value {
    json!({
        "counts": registry.counts(),
        "storage_root": state.storage.root(),
        "storage_mode": state.storage.mode().to_string(),
        "schema_version": SCHEMA_VERSION,
    })
}

/// Ids are primary keys; anything else cannot name a row
fn parse_id(id: &str) -> Result<u64> {
    id.parse()
        .map_err(|_| DcmIndexError::not_found("row", id))
}

fn list(state: &AppState, registry: &Registry, kind: &str, params: &QueryParams) -> Result<Value> {
    let request = PageRequest::from_query(params, state.settings.server.page_size)?;
    let path = format!("/dicom/{}/", kind);
    match kind {
        "patient" => list_rows::<Patient, PatientFilter>(
            registry,
            registry.patients.iter(),
            params,
            request,
            &path,
            serializers::patient,
        ),
        "study" => list_rows::<Study, StudyFilter>(
            registry,
            registry.studies.iter(),
            params,
            request,
            &path,
            serializers::study,
        ),
        "series" => list_rows::<Series, SeriesFilter>(
            registry,
            registry.series.iter(),
            params,
            request,
            &path,
            serializers::series,
        ),
        "image" => list_rows::<Image, ImageFilter>(
            registry,
            registry.images.iter(),
            params,
            request,
            &path,
            serializers::image,
        ),
        _ => Err(DcmIndexError::not_found("route", kind)),
    }
}

fn list_rows<'a, T: 'a, F: FilterSet<T>>(
    registry: &Registry,
    rows: impl IntoIterator<Item = &'a T>,
    params: &QueryParams,
    request: PageRequest,
    path: &str,
    render: fn(&T) -> Value,
) -> Result<Value> {
    let filter = F::from_query(params)?;
    let page = paginate(filter.apply(registry, rows), request, path, params.pairs())?;
    Ok(serde_json::to_value(page.map(render))?)
}

fn detail(registry: &Registry, kind: &str, id: &str) -> Result<Value> {
    let id = parse_id(id)?;
    match kind {
        "patient" => registry.get_patient(id).map(serializers::patient),
        "study" => registry.get_study(id).map(serializers::study),
        "series" => registry.get_series(id).map(serializers::series),
        "image" => registry
            .get_image(id)
            .map(|image| serializers::image_detail(registry, image)),
        _ => Err(DcmIndexError::not_found("route", kind)),
    }
}

/// Resolved file paths of every series of a patient
fn download(state: &AppState, registry: &Registry, uid: &str) -> Result<Value> {
    let series: BTreeMap<String, Vec<String>> = registry
        .patient_file_set(uid)?
        .into_iter()
        .map(|(series_uid, paths)| {
            let resolved = paths
                .iter()
                .map(|p| state.storage.resolve(p).display().to_string())
                .collect();
            (series_uid, resolved)
        })
        .collect();
    let files = series.values().map(Vec::len).sum::<usize>();
    Ok(json!({
        "patient": uid,
        "files": files,
        "series": series,
    }))
}
