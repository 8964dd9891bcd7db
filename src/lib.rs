//! Code context retrieval for language models.
//!
//! Given a repository and a natural-language query, `coderecall` returns the
//! files or line-range snippets relevant to the query. Cheap heuristics
//! (BM25 keyword search, fuzzy path matching, file tree shrinking) narrow the
//! candidates; a language model acting as [`oracle::DecisionOracle`] makes the
//! relevance decisions.

pub mod chunking;
pub mod cli;
pub mod config;
pub mod filetree;
pub mod keyword;
pub mod logging;
pub mod oracle;
pub mod preview;
pub mod repository;
pub mod retrieval;
pub mod types;

pub use config::Settings;
pub use filetree::FileTree;
pub use oracle::{DecisionOracle, LlmOracle};
pub use repository::{KeywordSearcher, Repository, SimilarityFinder, SnippetProvider};
pub use retrieval::{Retrieval, Retriever};
pub use types::{RepoRef, SnippetRange};
