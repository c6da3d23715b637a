use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Domain interface for the object store backing the async recognition
/// path.
pub trait ObjectStore: Send {
    /// Upload a local file under `key` and return its URI. The URI must
    /// carry no query parameters; the recognition backend rejects them.
    fn upload(&self, local: &Path, key: &str) -> Result<String, StorageError>;

    /// Best-effort deletion; implementations log failures and never
    /// propagate them.
    fn delete(&self, key: &str);
}
