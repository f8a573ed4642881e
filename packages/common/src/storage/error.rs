use thiserror::Error;

/// Errors that can occur while storing or reading uploaded files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No file is stored under the requested path.
    #[error("file not found: {0}")]
    NotFound(String),
    /// The stored path is malformed or points outside a known bucket.
    #[error("invalid stored path: {0}")]
    InvalidPath(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The upload exceeds the configured size limit.
    #[error("file exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
