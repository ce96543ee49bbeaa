/// Failures of the storage collaborator.
///
/// These are the "unexpected" tier: the processor logs them and reports a generic failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create bundle directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write bundle file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read bundle file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to remove bundle: {0}")]
    FileRemove(std::io::Error),
    #[error("failed to serialize bundle: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize bundle: {0}")]
    Deserialization(serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised while resolving configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid bundle id: {0}")]
    InvalidBundleId(#[from] dualcode_uuid::UuidError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
