//! Snippet search over a whole repository, persisted as one JSON blob.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::error::{IndexError, IndexResult};
use super::index::{InvertedIndex, SnippetId};
use crate::repository::pattern::PatternSet;
use crate::types::{RepoRef, SnippetRange};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSnippet {
    pub snippet: SnippetRange,
    pub score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeywordEngine {
    format_version: u32,
    /// `org/name` of the indexed repository
    repository: String,
    snippets: Vec<SnippetRange>,
    index: InvertedIndex,
}

impl KeywordEngine {
    /// Index every `(snippet, text)` pair in order.
    pub fn build(
        repository: impl Into<String>,
        mut index: InvertedIndex,
        documents: impl IntoIterator<Item = (SnippetRange, String)>,
    ) -> Self {
        let mut snippets = Vec::new();
        for (snippet, text) in documents {
            index.index_snippet(snippets.len() as SnippetId, &text);
            snippets.push(snippet);
        }
        tracing::debug!(
            target: "keyword",
            "indexed {} snippets, average length {:.1} tokens",
            snippets.len(),
            index.average_length()
        );
        Self {
            format_version: FORMAT_VERSION,
            repository: repository.into(),
            snippets,
            index,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn snippets(&self) -> &[SnippetRange] {
        &self.snippets
    }

    /// Rank the full snippet universe; snippets without a match score 0.
    ///
    /// Equal scores keep indexing order. Include patterns are matched
    /// against the snippet's file path.
    pub fn search_snippets(&self, query: &str, limit: Option<usize>, includes: &[String]) -> Vec<ScoredSnippet> {
        let scores = self.index.bm25_all(query);
        let includes = PatternSet::new(includes);

        let mut ranked: Vec<ScoredSnippet> = self
            .snippets
            .iter()
            .enumerate()
            .filter(|(_, s)| includes.is_empty() || includes.matches_any(&s.path))
            .map(|(id, snippet)| ScoredSnippet {
                snippet: snippet.clone(),
                score: scores.get(&(id as SnippetId)).copied().unwrap_or_default(),
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(limit) = limit {
            ranked.truncate(limit);
        }
        ranked
    }

    /// Files of the ranked snippets, first occurrence wins.
    pub fn search_files(&self, query: &str, limit: Option<usize>, includes: &[String]) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for scored in self.search_snippets(query, None, includes) {
            if limit.is_some_and(|limit| files.len() >= limit) {
                break;
            }
            if !files.contains(&scored.snippet.path) {
                files.push(scored.snippet.path);
            }
        }
        files
    }

    /// Cache location of the index of `repo` below `dir`, one directory per org.
    pub fn cache_file(dir: &Path, repo: &RepoRef) -> PathBuf {
        dir.join(&repo.org).join(format!("{}.kwe.json", repo.name))
    }

    pub fn save(&self, path: &Path) -> IndexResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        tracing::debug!(target: "keyword", "saved index of {} to {}", self.repository, path.display());
        Ok(())
    }

    /// Load a persisted index, refusing one built for another repository.
    pub fn load(path: &Path, expected_repository: &str) -> IndexResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let engine: KeywordEngine = serde_json::from_reader(reader)?;
        if engine.format_version != FORMAT_VERSION {
            return Err(IndexError::VersionMismatch {
                path: path.to_path_buf(),
                expected: FORMAT_VERSION,
                found: engine.format_version,
            });
        }
        if engine.repository != expected_repository {
            return Err(IndexError::IdentityMismatch {
                path: path.to_path_buf(),
                expected: expected_repository.to_string(),
                found: engine.repository,
            });
        }
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::Tokenizer;
    use tempfile::TempDir;

    fn engine() -> KeywordEngine {
        let docs = vec![
            (SnippetRange::new("views.py", 0, 10), "def render(page): pass".to_string()),
            (SnippetRange::new("auth.py", 0, 10), "def login(user): pass".to_string()),
            (SnippetRange::new("auth.py", 10, 20), "def logout(user): login_count -= 1".to_string()),
            (SnippetRange::new("db.py", 0, 10), "def connect(): pass".to_string()),
        ];
        KeywordEngine::build("acme/site", InvertedIndex::new(Tokenizer::default(), 1.2, 0.75), docs)
    }

    #[test]
    fn test_search_ranks_full_universe() {
        let ranked = engine().search_snippets("login", None, &[]);
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].snippet.path, "auth.py");
        assert!(ranked[0].score > 0.0);
        // Zero-score snippets keep indexing order
        let tail: Vec<_> = ranked[2..].iter().map(|s| s.snippet.path.as_str()).collect();
        assert_eq!(tail, vec!["views.py", "db.py"]);
    }

    #[test]
    fn test_search_files_dedups_and_filters() {
        let engine = engine();
        assert_eq!(engine.search_files("login", Some(2), &[]), vec!["auth.py", "views.py"]);
        assert_eq!(
            engine.search_files("login", None, &["db*".to_string()]),
            vec!["db.py"]
        );
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("indices").join("site.kwe.json");
        engine().save(&path).unwrap();

        let loaded = KeywordEngine::load(&path, "acme/site").unwrap();
        assert_eq!(loaded.snippets().len(), 4);
        assert_eq!(loaded.search_files("login", Some(1), &[]), vec!["auth.py"]);

        let err = KeywordEngine::load(&path, "other/site").unwrap_err();
        assert!(matches!(err, IndexError::IdentityMismatch { .. }));
    }

    #[test]
    fn test_cache_file_is_keyed_by_full_name() {
        let dir = Path::new("/cache");
        let acme = KeywordEngine::cache_file(dir, &RepoRef::new("acme", "site", "/srv/a"));
        let other = KeywordEngine::cache_file(dir, &RepoRef::new("other", "site", "/srv/b"));
        assert_eq!(acme, Path::new("/cache/acme/site.kwe.json"));
        assert_ne!(acme, other);
    }
}
