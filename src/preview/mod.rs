//! File previews shown to the decision oracle.
//!
//! A preview is a line-numbered condensation of a file. Every kept line has
//! the form `"{n} | {content}"`; elided spans are announced by unnumbered
//! note lines indented to match the code around them.

mod outline;
mod text;

pub use outline::OutlinePreview;
pub use text::{PlainPreview, ProsePreview};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::PreviewConfig;

const SPLITTER: &str = " | ";

/// Creates a preview of one file.
pub trait PreviewProvider: Send + Sync {
    fn preview(&self, path: &str, content: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    /// Syntax outline for code, paragraph heads for prose
    #[default]
    Outline,
    /// Every line, numbered
    Text,
}

impl fmt::Display for PreviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewKind::Outline => f.write_str("outline"),
            PreviewKind::Text => f.write_str("text"),
        }
    }
}

impl FromStr for PreviewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outline" => Ok(PreviewKind::Outline),
            "text" => Ok(PreviewKind::Text),
            other => Err(format!("Unknown preview kind '{other}' (expected outline or text)")),
        }
    }
}

pub fn create_preview(config: &PreviewConfig) -> Box<dyn PreviewProvider> {
    match config.kind {
        PreviewKind::Outline => Box::new(OutlinePreview::new(config.max_lines)),
        PreviewKind::Text => Box::new(PlainPreview),
    }
}

pub fn preview_line(number: usize, content: &str) -> String {
    format!("{number}{SPLITTER}{content}")
}

/// Line number and content of a preview line; note lines have no number.
pub fn parse_preview_line(line: &str) -> (Option<usize>, &str) {
    line.split_once(SPLITTER)
        .and_then(|(number, content)| Some((number.trim().parse::<usize>().ok()?, content)))
        .map_or((None, line), |(number, content)| (Some(number), content))
}

/// Blank prefix as wide as `"{number} | "`.
pub fn spacing_for(number: usize) -> String {
    " ".repeat(number.to_string().len() + SPLITTER.len())
}

pub fn indentation_of(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Three note lines replacing an elided span, aligned under `anchor`.
pub(crate) fn elision(anchor_number: usize, anchor_content: &str, note: &str) -> [String; 3] {
    let prefix = format!("{}{}", spacing_for(anchor_number), indentation_of(anchor_content));
    [
        format!("{prefix}..."),
        format!("{prefix}{note}"),
        format!("{prefix}...\n"),
    ]
}

/// Hide the line ranges `[start, end)` of `hidden` from a preview.
///
/// Lines without a number in the original preview count as hidden too, so
/// every gap is announced by a single note.
pub fn reduce_preview(preview: &str, hidden: &[(usize, usize)]) -> String {
    if hidden.is_empty() {
        return preview.to_string();
    }

    let parsed: Vec<(usize, &str, &str)> = preview
        .lines()
        .filter_map(|line| {
            let (number, content) = parse_preview_line(line);
            number.map(|n| (n, line, content))
        })
        .collect();
    let Some(max_number) = parsed.iter().map(|(n, _, _)| *n).max() else {
        return preview.to_string();
    };

    let mut slots: Vec<Option<(&str, &str)>> = vec![None; max_number + 1];
    for (number, line, content) in parsed {
        slots[number] = Some((line, content));
    }
    for &(start, end) in hidden {
        for slot in slots.iter_mut().take(end).skip(start) {
            *slot = None;
        }
    }

    let mut reduced: Vec<String> = Vec::new();
    let mut hidden_from: Option<usize> = None;
    let (mut anchor_number, mut anchor_content) = (0, "");
    for (number, slot) in slots.iter().enumerate() {
        match slot {
            Some((line, content)) => {
                if let Some(from) = hidden_from.take() {
                    let note = format!("(lines {from}-{} are hidden in preview)", number - 1);
                    reduced.extend(elision(anchor_number, anchor_content, &note));
                } else {
                    anchor_number = number;
                    anchor_content = content;
                }
                reduced.push(line.to_string());
            }
            None if hidden_from.is_none() => hidden_from = Some(number),
            None => {}
        }
    }
    if let Some(from) = hidden_from {
        let note = format!("(lines {from}-{max_number} are hidden in preview)");
        reduced.extend(elision(anchor_number, anchor_content, &note));
    }

    reduced.join("\n")
}
