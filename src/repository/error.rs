use std::path::PathBuf;
use thiserror::Error;

use crate::keyword::IndexError;

/// Fatal repository and argument errors.
///
/// These are never retried: a missing file or a mismatched index is a bug in
/// the caller's input, not an unreliable answer.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Repository path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Repository path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("File {path} does not exist in repository {repo}")]
    FileNotFound { repo: String, path: String },

    #[error("Invalid snippet {snippet}: {reason}")]
    InvalidSnippet { snippet: String, reason: String },

    #[error("Keyword index error: {0}")]
    Index(#[from] IndexError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
