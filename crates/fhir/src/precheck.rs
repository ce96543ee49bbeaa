//! Aggregate pre-check for immediate feedback before upload.
//!
//! This is not the authority: the server runs [`crate::validate_bundle`] and
//! [`crate::check_first`] regardless. The pre-check differs in two ways:
//! - an empty `entry` array is rejected
//! - every Condition is checked, and every dual-coding failure is reported
//!
//! Dual-coding failures do not make the pre-check fail; they are returned in the report so the
//! user can see all of them at once.

use crate::model::Bundle;
use crate::rules::check_all;
use crate::validator::{validate_bundle, StructuralError};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const JSON_MIME: &str = "application/json";

/// Why a file could not be pre-checked at all.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PrecheckError {
    #[error("Only JSON files are accepted")]
    NotJsonFile,

    #[error("Invalid JSON format")]
    InvalidJson,

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("Bundle missing entries array")]
    EmptyEntries,
}

/// Summary of a Bundle that passed the pre-check.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecheckReport {
    /// Number of resources per `resourceType`.
    pub resource_counts: BTreeMap<String, usize>,
    pub total_resources: usize,
    pub patient_count: usize,
    pub condition_count: usize,
    pub encounter_count: usize,
    pub observation_count: usize,
    pub dual_coding_valid: bool,
    pub dual_coding_errors: Vec<String>,
}

impl PrecheckReport {
    fn from_bundle(bundle: &Bundle) -> Self {
        let mut resource_counts: BTreeMap<String, usize> = BTreeMap::new();
        for resource in bundle.resources() {
            *resource_counts
                .entry(resource.resource_type().to_owned())
                .or_default() += 1;
        }
        let count = |t: &str| resource_counts.get(t).copied().unwrap_or(0);

        let dual_coding_errors = check_all(bundle);

        Self {
            total_resources: bundle.entries().len(),
            patient_count: count("Patient"),
            condition_count: count("Condition"),
            encounter_count: count("Encounter"),
            observation_count: count("Observation"),
            dual_coding_valid: dual_coding_errors.is_empty(),
            dual_coding_errors,
            resource_counts,
        }
    }
}

/// True if an upload looks like a JSON file, by MIME type or by file name.
///
/// MIME parameters such as `; charset=utf-8` are ignored; the type itself must be
/// exactly `application/json`.
pub fn is_json_upload(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|essence| essence.trim() == JSON_MIME)
        || file_name.is_some_and(|name| name.ends_with(".json"))
}

/// Pre-checks already parsed JSON.
///
/// # Errors
///
/// Returns [`PrecheckError::Structural`] for the first structural violation, or
/// [`PrecheckError::EmptyEntries`] if the Bundle has no entries.
pub fn precheck(value: &Value) -> Result<PrecheckReport, PrecheckError> {
    let bundle = validate_bundle(value)?;
    if bundle.entries().is_empty() {
        return Err(PrecheckError::EmptyEntries);
    }
    Ok(PrecheckReport::from_bundle(&bundle))
}

/// Parses file contents and pre-checks them.
///
/// # Errors
///
/// Returns [`PrecheckError::InvalidJson`] if `text` is not JSON, otherwise as [`precheck`].
pub fn precheck_text(text: &str) -> Result<PrecheckReport, PrecheckError> {
    let value: Value = serde_json::from_str(text).map_err(|_| PrecheckError::InvalidJson)?;
    precheck(&value)
}
