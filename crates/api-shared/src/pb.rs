//! Request and response bodies of the HTTP API.
//!
//! Field names are camelCase on the wire, matching what the upload page expects.

use chrono::{DateTime, Utc};
use dualcode_core::{BundleId, BundleSummary};
use fhir::PrecheckReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

/// Multipart form accepted by `POST /api/fhir/bundle`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadBundleForm {
    /// A `.json` file sent with content type `application/json`.
    #[schema(value_type = String, format = Binary)]
    pub bundle: Vec<u8>,
}

/// A FHIR Bundle document, passed through as raw JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(value_type = Object)]
pub struct BundleJson(pub serde_json::Value);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadBundleRes {
    pub message: String,
    pub bundle_id: String,
}

impl UploadBundleRes {
    pub fn processed(bundle_id: BundleId) -> Self {
        Self {
            message: "Bundle processed successfully".into(),
            bundle_id: bundle_id.to_string(),
        }
    }
}

/// Pre-check summary returned by `POST /api/fhir/bundle/validate`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrecheckRes {
    pub resource_counts: BTreeMap<String, usize>,
    pub total_resources: usize,
    pub patient_count: usize,
    pub condition_count: usize,
    pub encounter_count: usize,
    pub observation_count: usize,
    pub dual_coding_valid: bool,
    pub dual_coding_errors: Vec<String>,
}

impl From<PrecheckReport> for PrecheckRes {
    fn from(report: PrecheckReport) -> Self {
        Self {
            resource_counts: report.resource_counts,
            total_resources: report.total_resources,
            patient_count: report.patient_count,
            condition_count: report.condition_count,
            encounter_count: report.encounter_count,
            observation_count: report.observation_count,
            dual_coding_valid: report.dual_coding_valid,
            dual_coding_errors: report.dual_coding_errors,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BundleSummaryRes {
    pub id: String,
    pub received_at: DateTime<Utc>,
    pub bundle_type: String,
    pub resource_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl From<BundleSummary> for BundleSummaryRes {
    fn from(summary: BundleSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            received_at: summary.received_at,
            bundle_type: summary.bundle_type.to_string(),
            resource_count: summary.resource_count,
            file_name: summary.file_name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListBundlesRes {
    pub bundles: Vec<BundleSummaryRes>,
}
