//! Typed view of an uploaded FHIR Bundle.
//!
//! Resources are an open set keyed by `resourceType`. Only `Patient` and `Condition` are
//! interpreted; everything else is carried as [`Resource::Other`].
//!
//! The view is built leniently from `serde_json::Value` rather than derived with serde,
//! because uploaded resources routinely carry shapes a strict wire struct would reject
//! (missing `code`, a `coding` that is not a list, codings without a string `system`). Those
//! shapes are meaningful to the dual-coding rule and must survive into it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Bundle
// ============================================================================

/// The fixed set of Bundle kinds accepted by the validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Document,
    Message,
    Transaction,
    Batch,
    Collection,
    History,
    Searchset,
    TransactionResponse,
    BatchResponse,
}

impl BundleType {
    /// Every accepted bundle kind, in declaration order.
    pub const ALL: [BundleType; 9] = [
        BundleType::Document,
        BundleType::Message,
        BundleType::Transaction,
        BundleType::Batch,
        BundleType::Collection,
        BundleType::History,
        BundleType::Searchset,
        BundleType::TransactionResponse,
        BundleType::BatchResponse,
    ];

    /// Parses a bundle kind from its exact wire spelling.
    ///
    /// Matching is case-sensitive: `"Collection"` is not a bundle type.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Returns the wire spelling of this bundle kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Message => "message",
            Self::Transaction => "transaction",
            Self::Batch => "batch",
            Self::Collection => "collection",
            Self::History => "history",
            Self::Searchset => "searchset",
            Self::TransactionResponse => "transaction-response",
            Self::BatchResponse => "batch-response",
        }
    }
}

impl std::fmt::Display for BundleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structurally valid Bundle.
///
/// Only [`crate::validate_bundle`] constructs this type, so holding one means every
/// structural check has passed. The original JSON is kept alongside the typed view so it can
/// be stored and exported unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct Bundle {
    bundle_type: BundleType,
    entries: Vec<Entry>,
    raw: Value,
}

impl Bundle {
    pub(crate) fn new(bundle_type: BundleType, entries: Vec<Entry>, raw: Value) -> Self {
        Self {
            bundle_type,
            entries,
            raw,
        }
    }

    pub fn bundle_type(&self) -> BundleType {
        self.bundle_type
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Resources of every entry, in original order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.entries.iter().map(|e| &e.resource)
    }

    /// Condition resources, in original order.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.resources().filter_map(|r| match r {
            Resource::Condition(c) => Some(c),
            _ => None,
        })
    }

    pub fn has_patient(&self) -> bool {
        self.resources().any(|r| matches!(r, Resource::Patient(_)))
    }

    /// The JSON this bundle was validated from.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }
}

/// One slot of a Bundle's `entry` list.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub resource: Resource,
}

// ============================================================================
// Resources
// ============================================================================

/// A FHIR resource, keyed by `resourceType`.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    Patient(Patient),
    Condition(Condition),
    Other {
        resource_type: String,
        id: Option<String>,
    },
}

impl Resource {
    /// Builds the typed view of a resource object whose `resourceType` is already known.
    pub fn from_json(resource_type: &str, obj: &Map<String, Value>) -> Self {
        let id = obj.get("id").and_then(id_from_json);
        match resource_type {
            "Patient" => Resource::Patient(Patient { id }),
            "Condition" => Resource::Condition(Condition {
                id,
                code: obj.get("code").and_then(CodeableConcept::from_json),
            }),
            other => Resource::Other {
                resource_type: other.to_owned(),
                id,
            },
        }
    }

    pub fn resource_type(&self) -> &str {
        match self {
            Resource::Patient(_) => "Patient",
            Resource::Condition(_) => "Condition",
            Resource::Other { resource_type, .. } => resource_type,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Resource::Patient(p) => p.id.as_deref(),
            Resource::Condition(c) => c.id.as_deref(),
            Resource::Other { id, .. } => id.as_deref(),
        }
    }
}

/// A Patient resource. Only its presence matters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patient {
    pub id: Option<String>,
}

/// A Condition resource and the part of it the dual-coding rule reads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Condition {
    pub id: Option<String>,
    pub code: Option<CodeableConcept>,
}

/// `Condition.code`.
///
/// `coding` is `None` when the key is absent or is not a list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeableConcept {
    pub coding: Option<Vec<Coding>>,
    pub text: Option<String>,
}

impl CodeableConcept {
    fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let coding = obj
            .get("coding")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(Coding::from_json).collect());
        Some(Self {
            coding,
            text: string_field(obj, "text"),
        })
    }
}

/// A (system, code, display) triple.
///
/// Fields that are absent or not strings are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    fn from_json(value: &Value) -> Self {
        match value.as_object() {
            Some(obj) => Self {
                system: string_field(obj, "system"),
                code: string_field(obj, "code"),
                display: string_field(obj, "display"),
            },
            None => Self::default(),
        }
    }
}

// ============================================================================
// Helpers (internal)
// ============================================================================

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}

// Numeric ids are not valid FHIR but do turn up in hand-written bundles; keep them so error
// messages can still name the resource.
fn id_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
