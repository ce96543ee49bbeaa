//! # API REST
//!
//! REST API for dual-coded FHIR Bundle upload.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI documentation
//! - REST-specific concerns (multipart uploads, JSON error bodies, CORS, body limits)
//!
//! Uses `api-shared` for request and response types and `dualcode-core` for processing.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

pub use error::ApiError;

use api_shared::pb;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use dualcode_core::{BundleProcessor, BundleStore, CoreConfig};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

/// Application state for the REST API server
///
/// Shared by every handler; cloning it is cheap.
#[derive(Clone)]
pub struct AppState {
    pub processor: BundleProcessor,
    pub max_bundle_bytes: usize,
}

impl AppState {
    pub fn new(cfg: &CoreConfig, store: Arc<dyn BundleStore>) -> Self {
        Self {
            processor: BundleProcessor::new(store),
            max_bundle_bytes: cfg.max_bundle_bytes(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::upload_bundle,
        handlers::precheck_bundle,
        handlers::list_bundles,
        handlers::export_bundle,
        handlers::delete_bundle,
    ),
    components(schemas(
        pb::HealthRes,
        pb::ErrorRes,
        pb::BundleJson,
        pb::UploadBundleForm,
        pb::UploadBundleRes,
        pb::PrecheckRes,
        pb::BundleSummaryRes,
        pb::ListBundlesRes,
    ))
)]
pub struct ApiDoc;

/// Build the application router.
///
/// Request bodies larger than `state.max_bundle_bytes` are refused with `413`.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_bundle_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/fhir/bundle", post(handlers::upload_bundle))
        .route("/api/fhir/bundle/validate", post(handlers::precheck_bundle))
        .route("/api/fhir/bundles", get(handlers::list_bundles))
        .route(
            "/api/fhir/bundle/:id",
            get(handlers::export_bundle).delete(handlers::delete_bundle),
        )
        .route("/api-docs/openapi.json", get(handlers::openapi_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
