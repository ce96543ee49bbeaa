//! Bundle processing.
//!
//! Runs the semantic rules over a structurally valid bundle and, if they pass, hands it to the
//! storage collaborator under a freshly generated id.
//!
//! Errors come in two tiers:
//! - domain violations ([`SemanticError`]) are returned with their specific message
//! - anything else (the store failing) is logged here and reported as
//!   [`PROCESSING_FAILED_MESSAGE`]

use crate::constants::PROCESSING_FAILED_MESSAGE;
use crate::store::{BundleStore, StoredBundle};
use chrono::Utc;
use dualcode_uuid::BundleId;
use fhir::{check_first, Bundle, SemanticError};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of processing one bundle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProcessingResult {
    /// The bundle passed every rule and was stored.
    Accepted { bundle_id: BundleId },
    /// The bundle broke a domain rule.
    Rejected(SemanticError),
    /// Something unexpected went wrong; details were logged.
    Failed,
}

impl ProcessingResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn bundle_id(&self) -> Option<BundleId> {
        match self {
            Self::Accepted { bundle_id } => Some(*bundle_id),
            _ => None,
        }
    }

    /// The message shown to the uploader, if processing did not succeed.
    pub fn error(&self) -> Option<String> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected(e) => Some(e.to_string()),
            Self::Failed => Some(PROCESSING_FAILED_MESSAGE.to_owned()),
        }
    }
}

/// Wire view of a processing outcome: `{ "success": bool, "error"?: string, "bundleId"?: string }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<BundleId>,
}

impl From<&ProcessingResult> for ProcessingOutcome {
    fn from(result: &ProcessingResult) -> Self {
        Self {
            success: result.is_success(),
            error: result.error(),
            bundle_id: result.bundle_id(),
        }
    }
}

/// Semantic checks and hand-off to storage.
#[derive(Clone)]
pub struct BundleProcessor {
    store: Arc<dyn BundleStore>,
}

impl BundleProcessor {
    pub fn new(store: Arc<dyn BundleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn BundleStore> {
        &self.store
    }

    /// Process a bundle that has already passed [`fhir::validate_bundle`].
    ///
    /// Every call generates a new id, so the same content processed twice is stored twice.
    pub async fn process(&self, bundle: &Bundle) -> ProcessingResult {
        self.process_upload(bundle, None).await
    }

    /// As [`Self::process`], recording the name of the uploaded file alongside the bundle.
    pub async fn process_upload(
        &self,
        bundle: &Bundle,
        file_name: Option<String>,
    ) -> ProcessingResult {
        let bundle_id = BundleId::new();

        if let Err(e) = check_first(bundle) {
            tracing::info!("rejected bundle: {}", e);
            return ProcessingResult::Rejected(e);
        }

        let resource_count = bundle.entries().len();
        let stored = StoredBundle {
            id: bundle_id,
            received_at: Utc::now(),
            bundle_type: bundle.bundle_type(),
            resource_count,
            file_name,
            bundle: bundle.raw().clone(),
        };

        if let Err(e) = self.store.put(stored).await {
            tracing::error!("Error processing bundle {}: {:?}", bundle_id, e);
            return ProcessingResult::Failed;
        }

        tracing::info!(
            "Processed bundle {} with {} resources",
            bundle_id,
            resource_count
        );
        ProcessingResult::Accepted { bundle_id }
    }
}
