use thiserror::Error;

use crate::repository::RepoError;

/// Errors that abort a retrieval.
///
/// Unreliable oracle answers never surface here; they fall back to default
/// decisions inside the oracle.
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error(transparent)]
    Repository(#[from] RepoError),

    #[error("Failed to create worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;
