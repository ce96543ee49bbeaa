//! # API Shared
//!
//! Shared definitions for the dualcode HTTP API.
//!
//! Contains:
//! - Request/response wire types with OpenAPI schemas (`pb` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`.

pub mod health;
pub mod pb;

pub use health::HealthService;
pub use pb::*;
