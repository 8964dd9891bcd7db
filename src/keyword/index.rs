//! Inverted index with BM25 ranking.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::tokenizer::Tokenizer;

/// Position of a snippet in the engine's snippet table.
pub type SnippetId = u32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvertedIndex {
    tokenizer: Tokenizer,
    bm25_k1: f64,
    bm25_b: f64,
    /// token -> [(snippet, occurrences)]
    postings: HashMap<String, Vec<(SnippetId, u32)>>,
    /// snippet -> number of tokens
    lengths: HashMap<SnippetId, u32>,
    total_tokens: u64,
    average_length: f64,
}

impl InvertedIndex {
    pub fn new(tokenizer: Tokenizer, bm25_k1: f64, bm25_b: f64) -> Self {
        Self {
            tokenizer,
            bm25_k1,
            bm25_b,
            postings: HashMap::new(),
            lengths: HashMap::new(),
            total_tokens: 0,
            average_length: 0.0,
        }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn num_snippets(&self) -> usize {
        self.lengths.len()
    }

    pub fn average_length(&self) -> f64 {
        self.average_length
    }

    pub fn index_snippet(&mut self, id: SnippetId, content: &str) {
        let tokens = self.tokenizer.tokenize(content);

        let mut counts: HashMap<&str, u32> = HashMap::new();
        for token in &tokens {
            *counts.entry(token.text.as_str()).or_default() += 1;
        }
        for (token, count) in counts {
            self.postings
                .entry(token.to_string())
                .or_default()
                .push((id, count));
        }

        if let Some(previous) = self.lengths.insert(id, tokens.len() as u32) {
            self.total_tokens -= u64::from(previous);
        }
        self.total_tokens += tokens.len() as u64;
        self.average_length = self.total_tokens as f64 / self.lengths.len() as f64;
    }

    /// Normalized BM25 score of every indexed snippet toward `query`.
    ///
    /// Scores are divided by the maximum so they fall in `[0, 1]`; when all
    /// snippets tie (no match at all included) every score stays 0.
    pub fn bm25_all(&self, query: &str) -> HashMap<SnippetId, f64> {
        let mut scores: HashMap<SnippetId, f64> = self.lengths.keys().map(|&id| (id, 0.0)).collect();
        let num_snippets = self.lengths.len() as f64;
        let (k1, b) = (self.bm25_k1, self.bm25_b);

        for token in self.tokenizer.tokenize(query) {
            let Some(postings) = self.postings.get(&token.text) else {
                continue;
            };
            let df = postings.len() as f64;
            let idf = (((num_snippets - df) + 0.5) / (df + 0.5) + 1.0).log10();
            for &(id, tf) in postings {
                let tf = f64::from(tf);
                let length = f64::from(self.lengths.get(&id).copied().unwrap_or_default());
                let relative_length = if self.average_length > 0.0 {
                    length / self.average_length
                } else {
                    0.0
                };
                let term_score = ((k1 + 1.0) * tf) / (tf + k1 * (1.0 - b + b * relative_length));
                *scores.entry(id).or_default() += idf * term_score;
            }
        }

        let max = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = scores.values().copied().fold(f64::INFINITY, f64::min);
        // Once min < max the effective minimum is 0
        if scores.is_empty() || max <= min || max <= 0.0 {
            return scores.into_keys().map(|id| (id, 0.0)).collect();
        }
        for score in scores.values_mut() {
            *score = (*score / max).clamp(0.0, 1.0);
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(docs: &[&str]) -> InvertedIndex {
        let mut index = InvertedIndex::new(Tokenizer::default(), 1.2, 0.75);
        for (id, doc) in docs.iter().enumerate() {
            index.index_snippet(id as SnippetId, doc);
        }
        index
    }

    #[test]
    fn test_average_length_is_running() {
        let index = index(&["alpha beta", "gamma delta epsilon zeta"]);
        // 2 unigrams + 1 bigram, 4 unigrams + 3 bigrams + 2 trigrams
        assert_eq!(index.num_snippets(), 2);
        assert!((index.average_length() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_matching_snippet_ranks_first() {
        let index = index(&[
            "def login(user, password): return check(user)",
            "def render(template): return html",
            "def connect(url): return socket",
        ]);
        let scores = index.bm25_all("how does login work");
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[&0], 1.0);
        assert_eq!(scores[&1], 0.0);
        assert_eq!(scores[&2], 0.0);
    }

    #[test]
    fn test_scores_are_normalized() {
        let index = index(&[
            "parse config file",
            "parse parse parse tokens",
            "write config",
            "unrelated words here",
        ]);
        let scores = index.bm25_all("parse config");
        assert!(scores.values().all(|s| (0.0..=1.0).contains(s)));
        assert!(scores.values().any(|s| *s == 1.0));
        assert_eq!(scores[&3], 0.0);
    }

    #[test]
    fn test_ties_and_no_match_score_zero() {
        let index = index(&["same text", "same text"]);
        assert!(index.bm25_all("same").values().all(|s| *s == 0.0));
        assert!(index.bm25_all("nothing").values().all(|s| *s == 0.0));
        assert!(InvertedIndex::new(Tokenizer::default(), 1.2, 0.75)
            .bm25_all("anything")
            .is_empty());
    }
}
