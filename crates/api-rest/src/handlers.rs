//! HTTP handlers for bundle upload, pre-check and management.

use api_shared::{
    BundleJson, BundleSummaryRes, ErrorRes, HealthRes, ListBundlesRes, PrecheckRes,
    UploadBundleForm, UploadBundleRes,
};
use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use dualcode_core::{BundleId, ProcessingResult};
use fhir::{is_json_upload, precheck, validate_bundle, PrecheckError};
use serde_json::Value;

use crate::{ApiDoc, ApiError, AppState};
use utoipa::OpenApi;

/// Name of the multipart field carrying the bundle file.
pub const BUNDLE_FIELD: &str = "bundle";

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(api_shared::HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/fhir/bundle",
    request_body(content = UploadBundleForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Bundle accepted and stored", body = UploadBundleRes),
        (status = 400, description = "No file, wrong MIME type, invalid JSON or structurally invalid bundle", body = ErrorRes),
        (status = 422, description = "Bundle failed semantic validation", body = ErrorRes),
        (status = 500, description = "Unexpected failure", body = ErrorRes)
    )
)]
/// Upload a FHIR Bundle
///
/// Reads the `bundle` field of a multipart form, parses it as JSON, runs the structural
/// validator and then the processor. The first violation found is returned as the error.
///
/// # Errors
/// - `400` if no file is sent, it is not `application/json`, it is not JSON, or it is not a
///   structurally valid Bundle
/// - `422` if the Bundle has no Patient or a Condition is not dual coded
/// - `500` if the bundle could not be stored
#[axum::debug_handler]
pub async fn upload_bundle(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadBundleRes>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(BUNDLE_FIELD) {
            let content_type = field.content_type().map(str::to_owned);
            let file_name = field.file_name().map(str::to_owned);
            let data = field.bytes().await?;
            upload = Some((content_type, file_name, data));
            break;
        }
    }

    let (content_type, file_name, data) = upload.ok_or(ApiError::MissingFile)?;
    if !is_json_upload(None, content_type.as_deref()) {
        return Err(ApiError::NotJson);
    }

    let value: Value = serde_json::from_slice(&data).map_err(|_| ApiError::InvalidJson)?;
    let bundle = validate_bundle(&value)?;

    tracing::info!(
        "Received {} bundle with {} entries ({} bytes)",
        bundle.bundle_type(),
        bundle.entries().len(),
        data.len()
    );

    match state.processor.process_upload(&bundle, file_name).await {
        ProcessingResult::Accepted { bundle_id } => Ok(Json(UploadBundleRes::processed(bundle_id))),
        ProcessingResult::Rejected(e) => Err(ApiError::Semantic(e)),
        ProcessingResult::Failed => Err(ApiError::ProcessingFailed),
    }
}

#[utoipa::path(
    post,
    path = "/api/fhir/bundle/validate",
    request_body(content = BundleJson, content_type = "application/json"),
    responses(
        (status = 200, description = "Pre-check summary", body = PrecheckRes),
        (status = 400, description = "Not `application/json`, invalid JSON, structurally invalid or empty bundle", body = ErrorRes)
    )
)]
/// Pre-check a FHIR Bundle without storing it
///
/// Reports every Condition that is not dual coded instead of stopping at the first one.
/// Dual-coding failures are part of a `200` response; only unusable input is a `400`.
#[axum::debug_handler]
pub async fn precheck_bundle(
    State(_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PrecheckRes>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !is_json_upload(None, content_type) {
        return Err(PrecheckError::NotJsonFile.into());
    }

    let value: Value = serde_json::from_slice(&body).map_err(|_| ApiError::InvalidJson)?;
    let report = precheck(&value)?;
    Ok(Json(report.into()))
}

#[utoipa::path(
    get,
    path = "/api/fhir/bundles",
    responses(
        (status = 200, description = "Stored bundles, newest first", body = ListBundlesRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List stored bundles
#[axum::debug_handler]
pub async fn list_bundles(State(state): State<AppState>) -> Result<Json<ListBundlesRes>, ApiError> {
    let bundles = state.processor.store().list().await?;
    Ok(Json(ListBundlesRes {
        bundles: bundles.into_iter().map(BundleSummaryRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/fhir/bundle/{id}",
    params(("id" = String, Path, description = "Bundle id (32 lowercase hex characters)")),
    responses(
        (status = 200, description = "The stored bundle JSON", body = BundleJson),
        (status = 400, description = "Invalid bundle id", body = ErrorRes),
        (status = 404, description = "Bundle not found", body = ErrorRes)
    )
)]
/// Export a stored bundle
///
/// Returns the uploaded JSON unchanged, as a file attachment.
#[axum::debug_handler]
pub async fn export_bundle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let stored = state
        .processor
        .store()
        .get(&id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let disposition = format!("attachment; filename=\"{}-export.json\"", export_stem(&stored));
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(stored.bundle)))
}

#[utoipa::path(
    delete,
    path = "/api/fhir/bundle/{id}",
    params(("id" = String, Path, description = "Bundle id (32 lowercase hex characters)")),
    responses(
        (status = 204, description = "Bundle deleted"),
        (status = 400, description = "Invalid bundle id", body = ErrorRes),
        (status = 404, description = "Bundle not found", body = ErrorRes)
    )
)]
/// Delete a stored bundle
#[axum::debug_handler]
pub async fn delete_bundle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if state.processor.store().delete(&id).await? {
        tracing::info!("Deleted bundle {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// Serve the OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// Helper functions

fn parse_id(id: &str) -> Result<BundleId, ApiError> {
    BundleId::parse(id).map_err(|e| {
        tracing::info!("Invalid bundle id: {}", e);
        ApiError::InvalidBundleId
    })
}

fn export_stem(stored: &dualcode_core::StoredBundle) -> String {
    stored
        .file_name
        .as_deref()
        .and_then(|name| name.strip_suffix(".json"))
        .filter(|stem| {
            !stem.is_empty()
                && stem
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        })
        .map(str::to_owned)
        .unwrap_or_else(|| stored.id.to_string())
}
