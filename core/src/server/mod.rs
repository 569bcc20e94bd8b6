//! Read-only JSON API over the registry

pub mod http;
pub mod pagination;
pub mod routes;
pub mod serializers;

pub use http::serve;
pub use pagination::{paginate, PageRequest, PaginatedResponse};
pub use routes::route;

use crate::config::Settings;
use crate::store::{Registry, Storage};
use hyper::StatusCode;
use parking_lot::RwLock;
use serde_json::{json, Value};

/// State shared by every connection
#[derive(Debug)]
pub struct AppState {
    pub registry: RwLock<Registry>,
    pub settings: Settings,
    pub storage: Storage,
}

impl AppState {
    pub fn new(registry: Registry, settings: Settings) -> Self {
        let storage = settings.storage();
        Self {
            registry: RwLock::new(registry),
            settings,
            storage,
        }
    }
}

/// Status and JSON body of a handled request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// `{"detail": ...}` body with the given status
    pub fn detail(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "detail": detail.into() }),
        }
    }

    pub fn not_found() -> Self {
        Self::detail(StatusCode::NOT_FOUND, "Not found.")
    }
}
