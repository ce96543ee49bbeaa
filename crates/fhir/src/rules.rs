//! Semantic rules over a structurally valid Bundle.
//!
//! Two entry points share the same per-check functions:
//! - [`check_first`] is the trust-boundary check: it stops at the first violation.
//! - [`check_all`] is the feedback check: it reports every Condition that is not dual coded.

use crate::coding::{has_dual_coding, CodingError};
use crate::model::{Bundle, Condition};

/// The first semantic violation found in a Bundle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("Bundle must contain at least one Patient resource")]
    MissingPatient,

    #[error(
        "Condition {} validation failed: {source}",
        .id.as_deref().unwrap_or("undefined")
    )]
    Condition {
        id: Option<String>,
        source: CodingError,
    },
}

/// Fails unless the Bundle holds at least one Patient resource.
pub fn require_patient(bundle: &Bundle) -> Result<(), SemanticError> {
    if bundle.has_patient() {
        Ok(())
    } else {
        Err(SemanticError::MissingPatient)
    }
}

/// Applies the dual-coding rule to one Condition, tagging failures with its id.
pub fn check_condition(condition: &Condition) -> Result<(), SemanticError> {
    has_dual_coding(condition).map_err(|source| SemanticError::Condition {
        id: condition.id.clone(),
        source,
    })
}

/// Runs every semantic rule and stops at the first violation.
///
/// The Patient requirement is checked before any Condition, then Conditions are checked in
/// entry order.
pub fn check_first(bundle: &Bundle) -> Result<(), SemanticError> {
    require_patient(bundle)?;
    bundle.conditions().try_for_each(check_condition)
}

/// Runs the dual-coding rule over every Condition and collects one message per failure.
///
/// Messages are numbered by position among Conditions, starting at 1:
/// `"Condition 2: Missing ICD-11 coding"`.
pub fn check_all(bundle: &Bundle) -> Vec<String> {
    bundle
        .conditions()
        .enumerate()
        .filter_map(|(i, condition)| {
            has_dual_coding(condition)
                .err()
                .map(|e| format!("Condition {}: {}", i + 1, e))
        })
        .collect()
}
