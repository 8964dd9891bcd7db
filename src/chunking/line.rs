use super::{Chunker, line_count};
use crate::types::SnippetRange;

/// Fixed windows of `window` lines; the last one may be shorter.
#[derive(Debug, Clone)]
pub struct LineChunker {
    window: usize,
}

impl LineChunker {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub(crate) fn split_lines(&self, path: &str, num_lines: usize) -> Vec<SnippetRange> {
        (0..num_lines)
            .step_by(self.window)
            .map(|start| SnippetRange::new(path, start, (start + self.window).min(num_lines)))
            .collect()
    }
}

impl Chunker for LineChunker {
    fn split(&self, path: &str, content: &str) -> Vec<SnippetRange> {
        self.split_lines(path, line_count(content))
    }
}
