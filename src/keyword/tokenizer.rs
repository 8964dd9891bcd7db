//! Code-aware n-gram tokenizer.
//!
//! Words are split on underscores or camel-case boundaries, parts shorter
//! than two characters are dropped and everything is lower-cased. Consecutive
//! unigrams are then joined with `_` into n-grams up to `num_gram`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());

/// A token with byte offsets into the tokenized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenizer {
    pub num_gram: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self { num_gram: 3 }
    }
}

impl Tokenizer {
    pub fn new(num_gram: usize) -> Self {
        Self {
            num_gram: num_gram.max(1),
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let unigrams = unigrams(text);
        let mut tokens = unigrams.clone();
        for n in 2..=self.num_gram {
            tokens.extend(ngrams(n, &unigrams));
        }
        tokens
    }
}

fn push_if_valid(tokens: &mut Vec<Token>, part: &str, start: usize) {
    if part.chars().count() > 1 {
        tokens.push(Token {
            text: part.to_lowercase(),
            start,
            end: start + part.len(),
        });
    }
}

fn unigrams(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for word in WORD.find_iter(text) {
        let (word_text, word_start) = (word.as_str(), word.start());
        if word_text.contains('_') {
            let mut offset = 0;
            for part in word_text.split('_') {
                push_if_valid(&mut tokens, part, word_start + offset);
                offset += part.len() + 1;
            }
            continue;
        }
        let parts = camel_parts(word_text);
        if parts.is_empty() {
            push_if_valid(&mut tokens, word_text, word_start);
        } else {
            for (start, end) in parts {
                push_if_valid(&mut tokens, &word_text[start..end], word_start + start);
            }
        }
    }
    tokens
}

/// Byte spans matched by `[A-Z][a-z]+|[a-z]+|[A-Z]+(?=[A-Z]|$)`.
///
/// The trailing all-caps alternative needs a lookahead, so the scan is done
/// by hand: a capital run ending the word is taken whole, otherwise its last
/// capital is left to start the next part.
fn camel_parts(word: &str) -> Vec<(usize, usize)> {
    let bytes = word.as_bytes();
    let n = bytes.len();
    let run_end = |mut i: usize, pred: fn(&u8) -> bool| {
        while i < n && pred(&bytes[i]) {
            i += 1;
        }
        i
    };

    let mut parts = Vec::new();
    let mut i = 0;
    while i < n {
        let c = bytes[i];
        if c.is_ascii_uppercase() && i + 1 < n && bytes[i + 1].is_ascii_lowercase() {
            let end = run_end(i + 1, u8::is_ascii_lowercase);
            parts.push((i, end));
            i = end;
        } else if c.is_ascii_lowercase() {
            let end = run_end(i, u8::is_ascii_lowercase);
            parts.push((i, end));
            i = end;
        } else if c.is_ascii_uppercase() {
            let end = run_end(i, u8::is_ascii_uppercase);
            if end == n {
                parts.push((i, end));
                i = end;
            } else if end - 1 > i {
                parts.push((i, end - 1));
                i = end - 1;
            } else {
                i += 1;
            }
        } else {
            // Advance a whole character to stay on a char boundary
            i += word[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    parts
}

fn ngrams(n: usize, unigrams: &[Token]) -> Vec<Token> {
    unigrams
        .windows(n)
        .map(|window| Token {
            text: window
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join("_"),
            start: window[0].start,
            end: window[n - 1].end,
        })
        .collect()
}
