//! Syntax-aware chunking.
//!
//! Sibling subtrees are accumulated into a running byte range until the next
//! sibling would push it over the byte budget; a sibling that alone exceeds
//! the budget is split on its own children. The resulting ranges are then
//! stitched back together so that no bytes are lost between them, and ranges
//! with too little non-whitespace text are folded into their successor.

use tree_sitter::Node;

use super::language::Language;
use super::line::LineChunker;
use super::{Chunker, line_count};
use crate::types::SnippetRange;

/// Byte range of the source with the rows of its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start_byte: usize,
    end_byte: usize,
    start_row: usize,
    end_row: usize,
}

impl Span {
    fn empty_at(byte: usize, row: usize) -> Self {
        Self {
            start_byte: byte,
            end_byte: byte,
            start_row: row,
            end_row: row,
        }
    }

    fn of(node: &Node) -> Self {
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_row: node.start_position().row,
            end_row: node.end_position().row,
        }
    }

    fn len(&self) -> usize {
        self.end_byte - self.start_byte
    }

    fn extend_to(&mut self, other: &Span) {
        self.end_byte = other.end_byte;
        self.end_row = other.end_row;
    }
}

/// One level of the explicit descent.
struct Frame<'tree> {
    children: Vec<Node<'tree>>,
    next: usize,
    current: Span,
}

impl<'tree> Frame<'tree> {
    fn new(node: Node<'tree>) -> Self {
        let start = node.start_position();
        Self {
            children: node.children(&mut node.walk()).collect(),
            next: 0,
            current: Span::empty_at(node.start_byte(), start.row),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxChunker {
    max_bytes: usize,
    min_chars: usize,
    fallback: LineChunker,
}

impl SyntaxChunker {
    pub fn new(max_bytes: usize, min_chars: usize, fallback: LineChunker) -> Self {
        Self {
            max_bytes: max_bytes.max(1),
            min_chars,
            fallback,
        }
    }

    /// Accumulate sibling spans below `root`, descending into oversized nodes.
    ///
    /// The work stack holds one frame per open node, so the depth follows the
    /// syntax tree instead of the call stack.
    fn split_tree(&self, root: Node<'_>) -> Vec<Span> {
        let mut spans = Vec::new();
        let mut stack = vec![Frame::new(root)];

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.get(frame.next).copied() else {
                spans.push(frame.current);
                stack.pop();
                continue;
            };
            frame.next += 1;

            let child_span = Span::of(&child);
            if child_span.len() > self.max_bytes {
                spans.push(frame.current);
                frame.current = Span::empty_at(child_span.end_byte, child_span.end_row);
                stack.push(Frame::new(child));
            } else if child_span.len() + frame.current.len() > self.max_bytes {
                spans.push(frame.current);
                frame.current = child_span;
            } else {
                frame.current.extend_to(&child_span);
            }
        }

        spans
    }

    /// Close the gaps the syntax tree leaves between spans.
    fn stitch(spans: &mut [Span], root: &Span) {
        if let Some(first) = spans.first_mut() {
            first.start_byte = 0;
            first.start_row = 0;
        }
        for i in 0..spans.len().saturating_sub(1) {
            let next = spans[i + 1];
            spans[i].end_byte = next.start_byte;
            spans[i].end_row = next.start_row;
        }
        if let Some(last) = spans.last_mut() {
            last.end_byte = root.end_byte;
            last.end_row = root.end_row;
        }
    }

    /// Fold spans with too little text into the following one.
    fn merge_small(&self, spans: &[Span], source: &[u8]) -> Vec<Span> {
        let mut merged = Vec::new();
        let mut current = Span::empty_at(0, 0);
        for span in spans {
            current.extend_to(span);
            let text = &source[current.start_byte.min(source.len())..current.end_byte.min(source.len())];
            let solid = text.iter().filter(|b| !b.is_ascii_whitespace()).count();
            if solid > self.min_chars && text.contains(&b'\n') {
                merged.push(current);
                current = Span::empty_at(span.end_byte, span.end_row);
            }
        }
        if current.len() > 0 {
            merged.push(current);
        }
        merged
    }

    fn split_structurally(&self, path: &str, content: &str, language: Language) -> Option<Vec<SnippetRange>> {
        let mut parser = match language.parser() {
            Ok(parser) => parser,
            Err(e) => {
                tracing::warn!(target: "chunking", "{e}");
                return None;
            }
        };
        let tree = parser.parse(content, None)?;
        let root = tree.root_node();
        let root_span = Span::of(&root);
        let num_lines = line_count(content);

        let mut spans = self.split_tree(root);
        if spans.is_empty() {
            return Some(Vec::new());
        }
        if spans.len() == 1 {
            return Some(vec![SnippetRange::new(path, 0, (root_span.end_row + 1).min(num_lines))]);
        }

        Self::stitch(&mut spans, &root_span);
        let merged = self.merge_small(&spans, content.as_bytes());

        let mut rows: Vec<(usize, usize)> = merged.iter().map(|s| (s.start_row, s.end_row)).collect();
        // The last range includes the very last line
        if let Some(last) = rows.last_mut() {
            last.1 += 1;
        }
        Some(cover_gapless(path, &rows, num_lines))
    }
}

/// Turn row ranges into snippets covering `[0, num_lines)` exactly once.
///
/// Empty ranges are dropped and each range starts where the previous one
/// ended; the last one is stretched to the end of the file.
fn cover_gapless(path: &str, rows: &[(usize, usize)], num_lines: usize) -> Vec<SnippetRange> {
    let mut ranges: Vec<SnippetRange> = Vec::new();
    let mut cursor = 0;
    for &(_, end) in rows {
        let end = end.min(num_lines);
        if end <= cursor {
            continue;
        }
        ranges.push(SnippetRange::new(path, cursor, end));
        cursor = end;
    }
    if cursor < num_lines {
        match ranges.last_mut() {
            Some(last) => last.end = num_lines,
            None => ranges.push(SnippetRange::new(path, 0, num_lines)),
        }
    }
    ranges
}

impl Chunker for SyntaxChunker {
    fn split(&self, path: &str, content: &str) -> Vec<SnippetRange> {
        if line_count(content) == 0 {
            return Vec::new();
        }
        let structural = Language::from_path(path)
            .and_then(|language| self.split_structurally(path, content, language));
        match structural {
            Some(ranges) if !ranges.is_empty() => ranges,
            _ => {
                tracing::debug!(target: "chunking", "falling back to line windows for {path}");
                self.fallback.split(path, content)
            }
        }
    }
}
