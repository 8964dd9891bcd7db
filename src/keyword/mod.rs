//! Keyword search engine.
//!
//! Snippets are tokenized into code-aware n-grams, indexed into an inverted
//! index and ranked with BM25. The engine of a repository is persisted once
//! and reused across retrievals.

pub mod engine;
pub mod error;
pub mod index;
pub mod tokenizer;

pub use engine::{KeywordEngine, ScoredSnippet};
pub use error::{IndexError, IndexResult};
pub use index::{InvertedIndex, SnippetId};
pub use tokenizer::{Token, Tokenizer};
