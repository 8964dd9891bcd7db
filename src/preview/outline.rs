//! Syntax outline of code files.
//!
//! Top-level nodes are shown in full when short, descended into when long,
//! and otherwise cut down to their first and last lines with a note naming
//! the terms of the elided middle.

use indexmap::IndexSet;
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::Node;

use super::text::{PlainPreview, ProsePreview};
use super::{PreviewProvider, elision, preview_line};
use crate::chunking::Language;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

const PROSE_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "rst", "adoc"];

#[derive(Debug, Clone)]
pub struct OutlinePreview {
    /// Nodes shorter than this are shown in full
    min_lines: usize,
    /// Nodes longer than this are outlined by their children
    max_lines: usize,
    /// Lines kept at each end of an elided node
    kept_lines: usize,
    /// Terms named in an elision note
    kept_terms: usize,
}

impl OutlinePreview {
    pub fn new(max_lines: usize) -> Self {
        Self {
            min_lines: 5,
            max_lines: max_lines.max(5),
            kept_lines: 2,
            kept_terms: 5,
        }
    }

    fn outline(&self, language: Language, content: &str) -> Option<String> {
        let mut parser = language.parser().ok()?;
        let tree = parser.parse(content, None)?;
        let lines: Vec<&str> = content.lines().collect();

        let mut out = Vec::new();
        let mut last: Option<usize> = None;
        self.walk(tree.root_node(), &lines, &mut last, &mut out);
        Some(out.join("\n"))
    }

    fn walk(&self, node: Node<'_>, lines: &[&str], last: &mut Option<usize>, out: &mut Vec<String>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            let end = child.end_position().row.min(lines.len().saturating_sub(1));
            let next = last.map_or(0, |l| l + 1);
            let start = child.start_position().row.max(next);
            if start > end || start >= lines.len() {
                continue;
            }

            for n in next..start {
                out.push(preview_line(n, lines[n]));
            }

            let span = end - start;
            if span > self.max_lines {
                *last = Some(start.saturating_sub(1)).filter(|_| start > 0);
                self.walk(child, lines, last, out);
                // Lines of the node after its last child
                let resume = last.map_or(0, |l| l + 1);
                for n in resume..=end {
                    out.push(preview_line(n, lines[n]));
                }
            } else if span < self.min_lines {
                for n in start..=end {
                    out.push(preview_line(n, lines[n]));
                }
            } else {
                self.elide(start, end, lines, out);
            }
            *last = Some(end);
        }
    }

    fn elide(&self, start: usize, end: usize, lines: &[&str], out: &mut Vec<String>) {
        let head_end = start + self.kept_lines;
        let tail_start = end + 1 - self.kept_lines;

        for n in start..head_end {
            out.push(preview_line(n, lines[n]));
        }

        let mut terms: IndexSet<&str> = IndexSet::new();
        for line in &lines[head_end..tail_start] {
            terms.extend(WORD.find_iter(line).map(|m| m.as_str()));
        }
        let shown: Vec<&str> = terms.iter().copied().take(self.kept_terms).collect();
        let more = if terms.len() > shown.len() { "..." } else { "" };
        let note = format!(
            "(lines {head_end}-{} contains terms: {}{more})",
            tail_start - 1,
            shown.join(", ")
        );
        out.extend(elision(head_end - 1, lines[head_end - 1], &note));

        for n in tail_start..=end {
            out.push(preview_line(n, lines[n]));
        }
    }
}

impl PreviewProvider for OutlinePreview {
    fn preview(&self, path: &str, content: &str) -> String {
        if let Some(language) = Language::from_path(path) {
            match self.outline(language, content) {
                Some(outline) => return outline,
                None => tracing::debug!(target: "preview", "no syntax tree for {path}; showing full text"),
            }
        }

        let extension = path.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        if extension.is_some_and(|ext| PROSE_EXTENSIONS.contains(&ext.as_str())) {
            return ProsePreview::default().preview(path, content);
        }
        PlainPreview.preview(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preview::parse_preview_line;

    fn python_function(name: &str, body_lines: usize) -> String {
        let mut source = format!("def {name}(user):\n");
        for i in 0..body_lines {
            source.push_str(&format!("    step_{i} = check(user, {i})\n"));
        }
        source.push_str("    return user\n");
        source
    }

    fn numbers(preview: &str) -> Vec<usize> {
        preview.lines().filter_map(|l| parse_preview_line(l).0).collect()
    }

    #[test]
    fn test_short_nodes_shown_in_full() {
        let source = "import os\n\ndef f():\n    return 1\n";
        let preview = OutlinePreview::new(50).preview("a.py", source);
        assert_eq!(preview, "0 | import os\n1 | \n2 | def f():\n3 |     return 1");
    }

    #[test]
    fn test_medium_node_elided() {
        let source = python_function("login", 10);
        let preview = OutlinePreview::new(50).preview("auth.py", &source);

        assert_eq!(numbers(&preview), vec![0, 1, 10, 11]);
        assert!(preview.contains("(lines 2-9 contains terms: step_1, check, user, 1, step_2...)"));
        let note = preview
            .lines()
            .find(|l| l.contains("contains terms"))
            .unwrap();
        assert!(note.starts_with("        ("));
    }

    #[test]
    fn test_long_node_outlined_by_children() {
        let mut source = String::from("class Service:\n");
        for name in ["a", "b", "c"] {
            for line in python_function(name, 20).lines() {
                source.push_str(&format!("    {line}\n"));
            }
        }
        let preview = OutlinePreview::new(50).preview("service.py", &source);
        let numbers = numbers(&preview);

        assert_eq!(numbers[0], 0);
        assert!(numbers.contains(&1));
        assert!(numbers.contains(&23));
        assert!(!numbers.contains(&10));
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_unknown_extension_shows_every_line() {
        let preview = OutlinePreview::new(50).preview("Makefile", "all:\n\tcc main.c\n");
        assert_eq!(preview, "0 | all:\n1 | \tcc main.c");
    }
}
