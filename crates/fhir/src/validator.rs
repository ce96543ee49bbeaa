//! Structural Bundle validation.
//!
//! Checks run in a fixed order and the first failure is returned; callers surface that single
//! message verbatim.

use crate::model::{Bundle, BundleType, Entry, Resource};
use serde::Serialize;
use serde_json::{Map, Value};

/// The first structural violation found in an uploaded Bundle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    #[error("Not a valid JSON object")]
    NotAnObject,

    #[error("Not a FHIR Bundle (missing or incorrect resourceType)")]
    NotABundle,

    #[error("Invalid or missing bundle type")]
    InvalidBundleType,

    #[error("Bundle missing entries array")]
    MissingEntries,

    #[error("Entry {0} missing resource")]
    EntryMissingResource(usize),

    #[error("Entry {0} resource missing resourceType")]
    EntryMissingResourceType(usize),
}

/// Wire view of a validation outcome: `{ "isValid": bool, "error"?: string }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<&Result<T, StructuralError>> for ValidationResult {
    fn from(result: &Result<T, StructuralError>) -> Self {
        match result {
            Ok(_) => Self {
                is_valid: true,
                error: None,
            },
            Err(e) => Self {
                is_valid: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Validates the shape of untrusted JSON and returns the typed Bundle.
///
/// Order of checks:
/// 1. the value is an object
/// 2. `resourceType` is exactly `"Bundle"`
/// 3. `type` is one of [`BundleType::ALL`]
/// 4. `entry` is an array (an empty array is accepted)
/// 5. each entry, by index, has a `resource` object with a non-empty string `resourceType`
///
/// # Errors
///
/// Returns the [`StructuralError`] for the first check that fails.
pub fn validate_bundle(value: &Value) -> Result<Bundle, StructuralError> {
    let obj = as_object(value)?;
    check_resource_type(obj)?;
    let bundle_type = check_bundle_type(obj)?;
    let raw_entries = check_entries(obj)?;

    let entries = raw_entries
        .iter()
        .enumerate()
        .map(|(i, entry)| check_entry(i, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Bundle::new(bundle_type, entries, value.clone()))
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, StructuralError> {
    match value {
        Value::Object(map) => Ok(map),
        // An array is still a JSON container; it fails on the missing resourceType instead.
        Value::Array(_) => Err(StructuralError::NotABundle),
        _ => Err(StructuralError::NotAnObject),
    }
}

fn check_resource_type(obj: &Map<String, Value>) -> Result<(), StructuralError> {
    match obj.get("resourceType").and_then(Value::as_str) {
        Some("Bundle") => Ok(()),
        _ => Err(StructuralError::NotABundle),
    }
}

fn check_bundle_type(obj: &Map<String, Value>) -> Result<BundleType, StructuralError> {
    obj.get("type")
        .and_then(Value::as_str)
        .and_then(BundleType::parse)
        .ok_or(StructuralError::InvalidBundleType)
}

fn check_entries(obj: &Map<String, Value>) -> Result<&Vec<Value>, StructuralError> {
    obj.get("entry")
        .and_then(Value::as_array)
        .ok_or(StructuralError::MissingEntries)
}

fn check_entry(index: usize, entry: &Value) -> Result<Entry, StructuralError> {
    let resource = entry
        .get("resource")
        .and_then(Value::as_object)
        .ok_or(StructuralError::EntryMissingResource(index))?;

    let resource_type = resource
        .get("resourceType")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(StructuralError::EntryMissingResourceType(index))?;

    Ok(Entry {
        resource: Resource::from_json(resource_type, resource),
    })
}
