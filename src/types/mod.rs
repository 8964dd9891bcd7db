use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Identity of a repository on disk.
///
/// `org/name` is the key under which the keyword index is cached, so two
/// different checkouts must not share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub org: String,
    pub name: String,
    pub path: PathBuf,
}

impl RepoRef {
    pub fn new(org: impl Into<String>, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            org: org.into(),
            name: name.into(),
            path: path.into(),
        }
    }

    /// `org/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.org, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.full_name(), self.path.display())
    }
}

/// Parses `org/name:path`.
impl FromStr for RepoRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (full_name, path) = s
            .split_once(':')
            .ok_or_else(|| format!("Expected <org>/<name>:<path>, got '{s}'"))?;
        let (org, name) = full_name
            .split_once('/')
            .ok_or_else(|| format!("Expected <org>/<name> before ':', got '{full_name}'"))?;
        if org.is_empty() || name.is_empty() || path.is_empty() {
            return Err(format!("Incomplete repository reference '{s}'"));
        }
        Ok(Self::new(org, name, path))
    }
}

/// A half-open line range `[start, end)` of one repository file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnippetRange {
    pub path: String,
    pub start: usize,
    pub end: usize,
}

impl SnippetRange {
    pub fn new(path: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            path: path.into(),
            start,
            end,
        }
    }

    pub fn num_lines(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True when `other` lies within this range of the same file.
    pub fn covers(&self, other: &SnippetRange) -> bool {
        self.path == other.path && self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for SnippetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.path, self.start, self.end)
    }
}

/// Parses `<path>:<start>-<end>`.
impl FromStr for SnippetRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, lines) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("Expected <path>:<start>-<end>, got '{s}'"))?;
        let (start, end) = lines
            .split_once('-')
            .ok_or_else(|| format!("Expected <start>-<end>, got '{lines}'"))?;
        let start = start
            .parse::<usize>()
            .map_err(|e| format!("Invalid start line '{start}': {e}"))?;
        let end = end
            .parse::<usize>()
            .map_err(|e| format!("Invalid end line '{end}': {e}"))?;
        Ok(Self::new(path, start, end))
    }
}
