use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Index at {path} belongs to repository {found}, expected {expected}")]
    IdentityMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Index at {path} has format version {found}, expected {expected}")]
    VersionMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IndexResult<T> = Result<T, IndexError>;
