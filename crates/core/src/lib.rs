//! # Dualcode Core
//!
//! Core business logic for dual-coded FHIR bundle ingestion.
//!
//! This crate contains:
//! - startup configuration ([`CoreConfig`])
//! - the bundle processor: semantic checks, id generation, hand-off to storage
//! - the storage contract and its in-memory and on-disk implementations
//!
//! **No API concerns**: HTTP handling and status-code mapping belong in `api-rest`. Structural
//! validation and the dual-coding rule live in the `fhir` crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod processor;
pub mod store;

pub use config::CoreConfig;
pub use constants::{DEFAULT_MAX_BUNDLE_BYTES, DEFAULT_REST_ADDR};
pub use error::{CoreError, CoreResult, StoreError, StoreResult};
pub use processor::{BundleProcessor, ProcessingOutcome, ProcessingResult};
pub use store::{BundleStore, BundleSummary, FileBundleStore, MemoryBundleStore, StoredBundle};

pub use dualcode_uuid::BundleId;
