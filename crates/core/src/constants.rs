//! Constants used throughout the core crate.

/// Default REST listen address when `DUALCODE_REST_ADDR` is not set.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default upper bound on an uploaded bundle, in bytes (10 MiB).
pub const DEFAULT_MAX_BUNDLE_BYTES: usize = 10 * 1024 * 1024;

/// Filename of a stored bundle inside its sharded directory.
pub const BUNDLE_JSON_FILENAME: &str = "bundle.json";

/// Generic message for processing failures that are not domain violations.
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process bundle";
