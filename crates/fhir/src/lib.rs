//! FHIR Bundle boundary support for dual-coding ingestion.
//!
//! This crate owns everything that can be decided from the uploaded JSON alone:
//! - a lenient typed view of Bundles, entries and resources ([`model`])
//! - the NAMASTE + ICD-11 dual-coding rule ([`coding`])
//! - the structural Bundle validator ([`validator`])
//! - the semantic rule set with fail-fast and aggregate entry points ([`rules`])
//! - the aggregate pre-check used for immediate feedback before upload ([`precheck`])
//!
//! Nothing here performs I/O. Storage and id generation live in `dualcode-core`.

pub mod coding;
pub mod model;
pub mod precheck;
pub mod rules;
pub mod validator;

pub use coding::{has_dual_coding, CodingError, ICD11_SYSTEM, WHO_ICD11_RELEASE_PREFIX};
pub use model::{Bundle, BundleType, CodeableConcept, Coding, Condition, Entry, Patient, Resource};
pub use precheck::{is_json_upload, precheck, precheck_text, PrecheckError, PrecheckReport};
pub use rules::{check_all, check_first, SemanticError};
pub use validator::{validate_bundle, StructuralError, ValidationResult};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("Invalid JSON format")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid FHIR Bundle: {0}")]
    Structural(#[from] StructuralError),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Parse JSON text and run the structural validator over it.
///
/// # Errors
///
/// Returns [`FhirError::InvalidJson`] if the text is not JSON, or
/// [`FhirError::Structural`] with the first structural violation.
pub fn parse_bundle(text: &str) -> FhirResult<Bundle> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    Ok(validate_bundle(&value)?)
}
