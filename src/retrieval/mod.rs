//! Five-stage retrieval of relevant files and snippets.
//!
//! Stages run in order, each one finishing before the next starts:
//! 1. EDL: entity definition lookup from file names mentioned in the query
//! 2. KWS: keyword search over all snippets
//! 3. FTE: file tree exploration around the files found so far
//! 4. FPS: file preview scoring
//! 5. SCR: snippet retrieval inside the retained files

pub mod cancel;
pub mod error;
pub mod explore;
pub mod interval;
pub mod report;
pub mod retriever;
pub mod snippets;

pub use cancel::CancellationToken;
pub use error::{RetrievalError, RetrievalResult};
pub use interval::merge_overlapping_intervals;
pub use report::{Retrieval, StageReport};
pub use retriever::Retriever;
pub use snippets::{FoundSnippet, SnippetDeterminer, SnippetFinder};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the file tree is explored, and what happens when it is too large.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum FteStrategy {
    #[serde(rename = "disable-fte")]
    Disabled,
    /// Give up exploring when the tree exceeds its budget
    #[default]
    #[serde(rename = "files-then-dirs__give-up")]
    FilesThenDirsGiveUp,
    /// Shrink an oversized tree heuristically before giving up
    #[serde(rename = "files-then-dirs__try-shrinking")]
    FilesThenDirsTryShrinking,
}

impl FteStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            FteStrategy::Disabled => "disable-fte",
            FteStrategy::FilesThenDirsGiveUp => "files-then-dirs__give-up",
            FteStrategy::FilesThenDirsTryShrinking => "files-then-dirs__try-shrinking",
        }
    }
}

impl fmt::Display for FteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FteStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            FteStrategy::Disabled,
            FteStrategy::FilesThenDirsGiveUp,
            FteStrategy::FilesThenDirsTryShrinking,
        ]
        .into_iter()
        .find(|strategy| strategy.name() == s)
        .ok_or_else(|| format!("Unknown file tree exploration strategy '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SnippetFinderKind {
    /// Judge every chunk of the file
    #[default]
    #[serde(rename = "enumerative-finder")]
    Enumerative,
    /// Let the oracle pick line ranges from the file's preview
    #[serde(rename = "preview-finder")]
    Preview,
}

impl fmt::Display for SnippetFinderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnippetFinderKind::Enumerative => f.write_str("enumerative-finder"),
            SnippetFinderKind::Preview => f.write_str("preview-finder"),
        }
    }
}

impl FromStr for SnippetFinderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enumerative-finder" => Ok(SnippetFinderKind::Enumerative),
            "preview-finder" => Ok(SnippetFinderKind::Preview),
            other => Err(format!("Unknown snippet finder '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SnippetDeterminerKind {
    /// Relevant when the snippet's score reaches a threshold
    #[default]
    #[serde(rename = "snippet-scorer")]
    Scorer,
    /// Relevant when the oracle says so
    #[serde(rename = "snippet-judge")]
    Judge,
}

impl fmt::Display for SnippetDeterminerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnippetDeterminerKind::Scorer => f.write_str("snippet-scorer"),
            SnippetDeterminerKind::Judge => f.write_str("snippet-judge"),
        }
    }
}

impl FromStr for SnippetDeterminerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "snippet-scorer" => Ok(SnippetDeterminerKind::Scorer),
            "snippet-judge" => Ok(SnippetDeterminerKind::Judge),
            other => Err(format!("Unknown snippet determiner '{other}'")),
        }
    }
}
