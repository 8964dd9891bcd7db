//! Snippet chunking.
//!
//! A chunker partitions one file into an ordered, gapless list of line ranges
//! covering `[0, line_count)`. Two strategies exist:
//! - [`LineChunker`]: fixed windows of lines
//! - [`SyntaxChunker`]: groups syntax-tree siblings under a byte budget and
//!   falls back to line windows when no grammar matches the file

pub mod language;
pub mod line;
pub mod syntax;

pub use language::Language;
pub use line::LineChunker;
pub use syntax::SyntaxChunker;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ChunkingConfig;
use crate::types::SnippetRange;

/// Trait for snippet chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split `content` of the repository file `path` into line ranges.
    fn split(&self, path: &str, content: &str) -> Vec<SnippetRange>;
}

/// Strategy for splitting files into snippets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Fixed windows of lines.
    Line,
    /// Syntax-tree aware, with line windows as fallback.
    #[default]
    Syntax,
}

impl fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkingStrategy::Line => f.write_str("line"),
            ChunkingStrategy::Syntax => f.write_str("syntax"),
        }
    }
}

impl FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line" => Ok(ChunkingStrategy::Line),
            "syntax" => Ok(ChunkingStrategy::Syntax),
            other => Err(format!("Unknown chunking strategy '{other}' (expected line or syntax)")),
        }
    }
}

/// Create the chunker selected by configuration.
pub fn create_chunker(config: &ChunkingConfig) -> Box<dyn Chunker> {
    let lines = LineChunker::new(config.line_window);
    match config.strategy {
        ChunkingStrategy::Line => Box::new(lines),
        ChunkingStrategy::Syntax => Box::new(SyntaxChunker::new(
            config.max_snippet_bytes,
            config.min_snippet_chars,
            lines,
        )),
    }
}

/// Number of lines as produced by [`str::lines`].
pub fn line_count(content: &str) -> usize {
    content.lines().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        assert_eq!("line".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Line);
        assert_eq!("syntax".parse::<ChunkingStrategy>().unwrap(), ChunkingStrategy::Syntax);
        assert!("words".parse::<ChunkingStrategy>().is_err());
        assert_eq!(ChunkingStrategy::default().to_string(), "syntax");
    }

    #[test]
    fn test_create_chunker_by_strategy() {
        let content: String = (0..30).map(|i| format!("x = {i}\n")).collect();
        let config = ChunkingConfig {
            strategy: ChunkingStrategy::Line,
            line_window: 10,
            ..ChunkingConfig::default()
        };
        assert_eq!(create_chunker(&config).split("a.py", &content).len(), 3);

        let config = ChunkingConfig::default();
        let ranges = create_chunker(&config).split("a.py", &content);
        assert_eq!(ranges.first().unwrap().start, 0);
        assert_eq!(ranges.last().unwrap().end, 30);
    }

    #[test]
    fn test_line_count() {
        assert_eq!(line_count(""), 0);
        assert_eq!(line_count("\n"), 1);
        assert_eq!(line_count("a\nb"), 2);
        assert_eq!(line_count("a\nb\n"), 2);
    }
}
