//! Repository model.
//!
//! Enumerates files and directories under an exclusion policy and gives
//! access to file contents, snippets and the repository's keyword engine.
//! Capabilities used by the retrieval pipeline are split into the
//! [`SnippetProvider`], [`SimilarityFinder`] and [`KeywordSearcher`] traits.

pub mod content;
pub mod error;
pub mod exclude;
pub mod fuzzy;
pub mod pattern;
pub mod sanitize;

pub use error::{RepoError, RepoResult};
pub use exclude::ExclusionPolicy;

use ignore::WalkBuilder;
use parking_lot::RwLock;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::chunking::{Chunker, create_chunker};
use crate::config::{KeywordConfig, Settings};
use crate::keyword::{InvertedIndex, KeywordEngine, ScoredSnippet, Tokenizer};
use crate::types::{RepoRef, SnippetRange};
use pattern::PatternSet;

/// Access to file contents and their snippets.
pub trait SnippetProvider {
    fn get_file_content(&self, path: &str, with_line_numbers: bool) -> RepoResult<String>;

    fn get_snippet_content(
        &self,
        snippet: &SnippetRange,
        surroundings: usize,
        with_line_numbers: bool,
        separators: bool,
    ) -> RepoResult<String>;

    /// Chunks of one file, in order.
    fn snippets_of_file(&self, path: &str) -> RepoResult<Vec<SnippetRange>>;

    /// Consecutive chunks merged while their total stays within `size` lines.
    fn snippets_of_file_with_size(&self, path: &str, size: usize) -> RepoResult<Vec<SnippetRange>> {
        let chunks = self.snippets_of_file(path)?;
        if size == 0 {
            return Ok(chunks);
        }
        let mut merged: Vec<SnippetRange> = Vec::new();
        for chunk in chunks {
            match merged.last_mut() {
                Some(last) if last.end == chunk.start && last.num_lines() + chunk.num_lines() <= size => {
                    last.end = chunk.end;
                }
                _ => merged.push(chunk),
            }
        }
        Ok(merged)
    }
}

/// Fuzzy lookup of repository paths.
pub trait SimilarityFinder {
    fn find_similar_files(&self, path: &str, limit: usize, includes: &[String]) -> Vec<String>;

    fn find_similar_directories(&self, path: &str, limit: usize, includes: &[String]) -> Vec<String>;
}

/// BM25 search over every snippet of the repository.
pub trait KeywordSearcher {
    fn search_snippets(
        &self,
        query: &str,
        limit: Option<usize>,
        includes: &[String],
    ) -> RepoResult<Vec<ScoredSnippet>>;

    fn search_files(&self, query: &str, limit: Option<usize>, includes: &[String]) -> RepoResult<Vec<String>>;
}

/// One visible entry below the root, in walk order.
#[derive(Debug, Clone)]
struct Entry {
    path: String,
    depth: usize,
    is_dir: bool,
}

pub struct Repository {
    repo: RepoRef,
    root: PathBuf,
    policy: Arc<ExclusionPolicy>,
    sanitize: bool,
    chunker: Box<dyn Chunker>,
    keyword: KeywordConfig,
    index_dir: Option<PathBuf>,
    entries: OnceLock<Vec<Entry>>,
    snippets: OnceLock<Vec<SnippetRange>>,
    engine: RwLock<Option<Arc<KeywordEngine>>>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("repo", &self.repo)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open `repo` with settings; fails when its path is not a directory.
    pub fn open(repo: RepoRef, settings: &Settings) -> RepoResult<Self> {
        if !repo.path.exists() {
            return Err(RepoError::PathNotFound(repo.path.clone()));
        }
        if !repo.path.is_dir() {
            return Err(RepoError::NotADirectory(repo.path.clone()));
        }
        let root = repo.path.canonicalize()?;

        Ok(Self {
            repo,
            root,
            policy: Arc::new(ExclusionPolicy::new(&settings.repository, &[])),
            sanitize: settings.repository.sanitize_content,
            chunker: create_chunker(&settings.chunking),
            keyword: settings.keyword.clone(),
            index_dir: Some(settings.keyword_index_dir()),
            entries: OnceLock::new(),
            snippets: OnceLock::new(),
            engine: RwLock::new(None),
        })
    }

    /// Additional exclusion patterns on top of the configured ones.
    pub fn with_excludes(mut self, excludes: &[String], settings: &Settings) -> Self {
        self.policy = Arc::new(ExclusionPolicy::new(&settings.repository, excludes));
        self.entries = OnceLock::new();
        self.snippets = OnceLock::new();
        self
    }

    /// Where the keyword index is persisted; `None` keeps it in memory.
    pub fn with_index_dir(mut self, index_dir: Option<PathBuf>) -> Self {
        self.index_dir = index_dir;
        self
    }

    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn full_name(&self) -> String {
        self.repo.full_name()
    }

    fn entries(&self) -> &[Entry] {
        self.entries.get_or_init(|| self.walk())
    }

    fn walk(&self) -> Vec<Entry> {
        let policy = Arc::clone(&self.policy);
        let filter_root = self.root.clone();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let Some(relative) = relative_path(&filter_root, entry.path()) else {
                    return false;
                };
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !policy.should_exclude(entry.path(), &relative, is_dir)
            });

        let entries: Vec<Entry> = builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.depth() > 0)
            .filter_map(|entry| {
                let file_type = entry.file_type()?;
                if !file_type.is_dir() && !file_type.is_file() {
                    return None;
                }
                Some(Entry {
                    path: relative_path(&self.root, entry.path())?,
                    depth: entry.depth(),
                    is_dir: file_type.is_dir(),
                })
            })
            .collect();

        tracing::debug!(
            target: "repository",
            "{}: {} visible entries",
            self.repo.full_name(),
            entries.len()
        );
        entries
    }

    /// Repository-relative paths of all visible files.
    pub fn list_files(&self) -> Vec<String> {
        self.entries()
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.path.clone())
            .collect()
    }

    /// Visible directories, each with a trailing `/`; the root is `/`.
    pub fn list_directories(&self, include_root: bool) -> Vec<String> {
        let mut dirs: Vec<String> = self
            .entries()
            .iter()
            .filter(|e| e.is_dir)
            .map(|e| format!("{}/", e.path))
            .collect();
        if include_root {
            dirs.push("/".to_string());
        }
        dirs
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.entries().iter().any(|e| !e.is_dir && e.path == path)
    }

    pub fn has_directory(&self, path: &str) -> bool {
        if path == "/" {
            return true;
        }
        let path = path.trim_end_matches('/');
        self.entries().iter().any(|e| e.is_dir && e.path == path)
    }

    /// Indentation listing of the repository: two spaces per level,
    /// directories as their full path with a trailing `/`, files by name.
    ///
    /// Include patterns only filter files.
    pub fn render_file_tree(&self, includes: &[String]) -> String {
        let includes = PatternSet::new(includes);
        let mut rendered = String::new();
        for entry in self.entries() {
            if !entry.is_dir && !includes.is_empty() && !includes.matches_any(&entry.path) {
                continue;
            }
            rendered.push_str(&"  ".repeat(entry.depth - 1));
            if entry.is_dir {
                rendered.push_str(&entry.path);
                rendered.push('/');
            } else {
                rendered.push_str(entry.path.rsplit('/').next().unwrap_or(&entry.path));
            }
            rendered.push('\n');
        }
        rendered
    }

    fn read_file(&self, path: &str) -> RepoResult<String> {
        let absolute = self.root.join(path);
        if !absolute.is_file() {
            return Err(RepoError::FileNotFound {
                repo: self.full_name(),
                path: path.to_string(),
            });
        }
        let bytes = std::fs::read(absolute)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Chunks of every visible file, computed once.
    pub fn snippets(&self) -> &[SnippetRange] {
        self.snippets.get_or_init(|| {
            let files = self.list_files();
            let per_file: Vec<Vec<SnippetRange>> = files
                .par_iter()
                .map(|file| match self.read_file(file) {
                    Ok(content) => self.chunker.split(file, &content),
                    Err(e) => {
                        tracing::warn!(target: "repository", "skipping {file}: {e}");
                        Vec::new()
                    }
                })
                .collect();
            per_file.into_iter().flatten().collect()
        })
    }

    /// The keyword engine, loaded from disk or built on first use.
    pub fn keyword_engine(&self) -> RepoResult<Arc<KeywordEngine>> {
        if let Some(engine) = self.engine.read().as_ref() {
            return Ok(Arc::clone(engine));
        }
        let mut guard = self.engine.write();
        if let Some(engine) = guard.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let cache_file = self
            .index_dir
            .as_ref()
            .map(|dir| KeywordEngine::cache_file(dir, &self.repo));
        let engine = match cache_file {
            Some(path) if path.exists() => {
                tracing::debug!(target: "repository", "loading keyword index from {}", path.display());
                KeywordEngine::load(&path, &self.full_name())?
            }
            _ => self.build_and_save_engine()?,
        };

        let engine = Arc::new(engine);
        *guard = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Rebuild the keyword index from the working tree, replacing any cached one.
    pub fn rebuild_keyword_engine(&self) -> RepoResult<Arc<KeywordEngine>> {
        let engine = Arc::new(self.build_and_save_engine()?);
        *self.engine.write() = Some(Arc::clone(&engine));
        Ok(engine)
    }

    fn build_and_save_engine(&self) -> RepoResult<KeywordEngine> {
        let engine = self.build_engine();
        if let Some(dir) = &self.index_dir {
            engine.save(&KeywordEngine::cache_file(dir, &self.repo))?;
        }
        Ok(engine)
    }

    fn build_engine(&self) -> KeywordEngine {
        let snippets = self.snippets();
        let mut documents = Vec::with_capacity(snippets.len());
        let mut current: Option<(String, Vec<String>)> = None;

        for snippet in snippets {
            if current.as_ref().is_none_or(|(path, _)| path != &snippet.path) {
                let lines = match self.read_file(&snippet.path) {
                    Ok(content) => content.lines().map(str::to_string).collect(),
                    Err(e) => {
                        tracing::warn!(target: "repository", "skipping {}: {e}", snippet.path);
                        Vec::new()
                    }
                };
                current = Some((snippet.path.clone(), lines));
            }
            let Some((_, lines)) = current.as_ref() else {
                continue;
            };
            let end = snippet.end.min(lines.len());
            let start = snippet.start.min(end);
            documents.push((snippet.clone(), lines[start..end].join("\n")));
        }

        let index = InvertedIndex::new(
            Tokenizer::new(self.keyword.num_gram),
            self.keyword.bm25_k1,
            self.keyword.bm25_b,
        );
        KeywordEngine::build(self.full_name(), index, documents)
    }
}

impl SnippetProvider for Repository {
    fn get_file_content(&self, path: &str, with_line_numbers: bool) -> RepoResult<String> {
        let mut text = self.read_file(path)?;
        if self.sanitize {
            text = sanitize::sanitize_content(&text);
        }
        if with_line_numbers {
            text = content::with_line_numbers(&text);
        }
        Ok(text)
    }

    fn get_snippet_content(
        &self,
        snippet: &SnippetRange,
        surroundings: usize,
        with_line_numbers: bool,
        separators: bool,
    ) -> RepoResult<String> {
        if snippet.start >= snippet.end {
            return Err(RepoError::InvalidSnippet {
                snippet: snippet.to_string(),
                reason: "start must be before end".to_string(),
            });
        }
        let text = self.get_file_content(&snippet.path, with_line_numbers)?;
        let lines: Vec<&str> = text.lines().collect();
        Ok(content::extract_snippet_lines(
            &lines,
            snippet.start,
            snippet.end,
            surroundings,
            separators,
        ))
    }

    fn snippets_of_file(&self, path: &str) -> RepoResult<Vec<SnippetRange>> {
        let text = self.read_file(path)?;
        Ok(self.chunker.split(path, &text))
    }
}

impl SimilarityFinder for Repository {
    fn find_similar_files(&self, path: &str, limit: usize, includes: &[String]) -> Vec<String> {
        let includes = PatternSet::new(includes);
        let files: Vec<String> = self
            .list_files()
            .into_iter()
            .filter(|f| includes.is_empty() || includes.matches_any(f))
            .collect();
        fuzzy::find_similar(path, &files, limit)
    }

    fn find_similar_directories(&self, path: &str, limit: usize, includes: &[String]) -> Vec<String> {
        let includes = PatternSet::new(includes);
        let dirs: Vec<String> = self
            .list_directories(false)
            .into_iter()
            .filter(|d| includes.is_empty() || includes.matches_any(d))
            .collect();
        fuzzy::find_similar(path, &dirs, limit)
    }
}

impl KeywordSearcher for Repository {
    fn search_snippets(
        &self,
        query: &str,
        limit: Option<usize>,
        includes: &[String],
    ) -> RepoResult<Vec<ScoredSnippet>> {
        Ok(self.keyword_engine()?.search_snippets(query, limit, includes))
    }

    fn search_files(&self, query: &str, limit: Option<usize>, includes: &[String]) -> RepoResult<Vec<String>> {
        Ok(self.keyword_engine()?.search_files(query, limit, includes))
    }
}

/// `/`-separated path of `path` below `root`.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
