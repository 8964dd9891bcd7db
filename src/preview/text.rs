//! Previews of files without a syntax outline.

use super::{PreviewProvider, elision, preview_line};

/// Every line of the file, numbered.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPreview;

impl PreviewProvider for PlainPreview {
    fn preview(&self, _path: &str, content: &str) -> String {
        content
            .lines()
            .enumerate()
            .map(|(n, line)| preview_line(n, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Paragraph heads and tails of prose.
///
/// Paragraphs are separated by blank lines. Short paragraphs are kept whole;
/// longer ones keep their first and last line. Lines with many sentences
/// keep only their first and last sentence.
#[derive(Debug, Clone, Copy)]
pub struct ProsePreview {
    max_paragraph_lines: usize,
}

impl Default for ProsePreview {
    fn default() -> Self {
        Self { max_paragraph_lines: 3 }
    }
}

impl ProsePreview {
    fn sentence_line(number: usize, line: &str) -> String {
        let mut sentences: Vec<&str> = line.split('.').collect();
        if sentences.last() == Some(&"") {
            sentences.pop();
        }
        match sentences.as_slice() {
            [first, .., last] if sentences.len() > 2 => preview_line(
                number,
                &format!("{first} ... (in-between sentences are hidden in preview) ... {last}"),
            ),
            _ => preview_line(number, line),
        }
    }
}

impl PreviewProvider for ProsePreview {
    fn preview(&self, _path: &str, content: &str) -> String {
        let lines: Vec<&str> = content.lines().collect();
        let mut out = Vec::new();

        let mut start = 0;
        while start < lines.len() {
            let mut end = start + 1;
            while end < lines.len() && !lines[end].trim().is_empty() {
                end += 1;
            }

            if end - start <= self.max_paragraph_lines {
                for (n, line) in lines.iter().enumerate().take(end).skip(start) {
                    out.push(Self::sentence_line(n, line));
                }
            } else {
                out.push(Self::sentence_line(start, lines[start]));
                let note = format!("(lines {}-{} are hidden in preview)", start + 1, end - 2);
                out.extend(elision(start, lines[start], &note));
                out.push(Self::sentence_line(end - 1, lines[end - 1]));
            }

            // Blank separator
            if end < lines.len() {
                out.push(preview_line(end, lines[end]));
            }
            start = end + 1;
        }

        out.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_numbers_every_line() {
        assert_eq!(PlainPreview.preview("x", "a\n\nb\n"), "0 | a\n1 | \n2 | b");
        assert_eq!(PlainPreview.preview("x", ""), "");
    }

    #[test]
    fn test_short_paragraphs_kept() {
        let preview = ProsePreview::default().preview("notes.txt", "Title\n\nOne.\nTwo.\n");
        assert_eq!(preview, "0 | Title\n1 | \n2 | One.\n3 | Two.");
    }

    #[test]
    fn test_long_paragraph_elided() {
        let text = "Intro\nalpha\nbeta\ngamma\nOutro\n\nNext\n";
        let preview = ProsePreview::default().preview("notes.txt", text);
        assert_eq!(
            preview,
            "0 | Intro\n    ...\n    (lines 1-3 are hidden in preview)\n    ...\n\n4 | Outro\n5 | \n6 | Next"
        );
    }

    #[test]
    fn test_many_sentences_abbreviated() {
        let preview = ProsePreview::default().preview("a.txt", "First. Second. Third. Last.");
        assert_eq!(
            preview,
            "0 | First ... (in-between sentences are hidden in preview) ...  Last"
        );
        let preview = ProsePreview::default().preview("a.txt", "One. Two.");
        assert_eq!(preview, "0 | One. Two.");
    }
}
