//! Text helpers for file and snippet contents.

pub const SNIPPET_START: &str = "===START OF SNIPPET===";
pub const SNIPPET_END: &str = "===END OF SNIPPET===";

/// Prefix every line with `"{i} | "`.
pub fn with_line_numbers(content: &str) -> String {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| format!("{i} | {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lines `[start, end)` plus `surroundings` lines of context on each side.
///
/// Every emitted line ends with `\n`; with `separators` the requested range
/// is bracketed by marker lines.
pub fn extract_snippet_lines<S: AsRef<str>>(
    lines: &[S],
    start: usize,
    end: usize,
    surroundings: usize,
    separators: bool,
) -> String {
    let clamp = |i: usize| i.min(lines.len());
    let (start, end) = (clamp(start), clamp(end.max(start)));
    let before = start.saturating_sub(surroundings);
    let after = clamp(end + surroundings);

    let mut snippet = String::new();
    let emit = |range: std::ops::Range<usize>, snippet: &mut String| {
        for line in &lines[range] {
            snippet.push_str(line.as_ref());
            snippet.push('\n');
        }
    };

    emit(before..start, &mut snippet);
    if separators {
        snippet.push_str(SNIPPET_START);
        snippet.push('\n');
    }
    emit(start..end, &mut snippet);
    if separators {
        snippet.push_str(SNIPPET_END);
        snippet.push('\n');
    }
    emit(end..after, &mut snippet);
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_line_numbers() {
        assert_eq!(with_line_numbers("a\nb\n"), "0 | a\n1 | b");
    }

    #[test]
    fn test_extract_with_separators_and_context() {
        let lines = ["l0", "l1", "l2", "l3", "l4"];
        assert_eq!(
            extract_snippet_lines(&lines, 2, 3, 1, true),
            "l1\n===START OF SNIPPET===\nl2\n===END OF SNIPPET===\nl3\n"
        );
    }

    #[test]
    fn test_extract_clamps_to_file() {
        let lines = ["l0", "l1"];
        assert_eq!(extract_snippet_lines(&lines, 0, 9, 3, false), "l0\nl1\n");
    }
}
