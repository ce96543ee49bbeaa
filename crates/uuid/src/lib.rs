//! Bundle identifier and sharded-path utilities.
//!
//! Every bundle accepted by the processor is given a freshly generated identifier. The
//! identifier is returned to the uploader and is the key under which the storage collaborator
//! keeps the bundle.
//!
//! To keep path derivation deterministic, bundle identifiers use a *canonical* UUID
//! representation: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! This crate provides:
//! - [`BundleId`], a wrapper that *guarantees* the canonical format once constructed.
//! - Sharding logic to derive an on-disk location from an identifier.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Identifiers arriving from outside (HTTP path segments, CLI arguments) must already be
//! canonical. Use [`BundleId::parse`] to validate them.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, bundles are stored under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`

mod service;

pub use service::BundleId;

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
