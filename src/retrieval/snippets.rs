//! Snippet finders and relevance determiners.
//!
//! A finder proposes line ranges of one file; a determiner decides whether a
//! proposed range is relevant to the query.

use rayon::prelude::*;

use super::cancel::CancellationToken;
use super::error::RetrievalResult;
use super::interval::merge_overlapping_intervals;
use super::{SnippetDeterminerKind, SnippetFinderKind};
use crate::chunking::line_count;
use crate::oracle::{Decision, DecisionOracle, SnippetAnswer, SnippetRequest, Violation, prompts};
use crate::preview::{PreviewProvider, reduce_preview};
use crate::repository::{Repository, SnippetProvider};
use crate::types::SnippetRange;

/// A relevant snippet and why it was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundSnippet {
    pub range: SnippetRange,
    pub reason: String,
}

/// Decides whether a snippet is relevant to a query.
pub trait SnippetDeterminer: Send + Sync {
    fn determine(&self, query: &str, snippet: &SnippetRange, content: &str) -> Decision<bool>;
}

/// Finds the relevant snippets of one file.
pub trait SnippetFinder: Send + Sync {
    fn find(&self, query: &str, file: &str) -> RetrievalResult<Vec<FoundSnippet>>;
}

/// Relevant when the oracle's score reaches the threshold.
pub struct ScoreDeterminer<'a> {
    oracle: &'a dyn DecisionOracle,
    threshold: u8,
}

impl<'a> ScoreDeterminer<'a> {
    pub fn new(oracle: &'a dyn DecisionOracle, threshold: u8) -> Self {
        Self { oracle, threshold }
    }
}

impl SnippetDeterminer for ScoreDeterminer<'_> {
    fn determine(&self, query: &str, snippet: &SnippetRange, content: &str) -> Decision<bool> {
        let Decision { value: score, reason } = self.oracle.score_snippet(query, snippet, content);
        let relevant = score >= self.threshold;
        let verdict = if relevant { "relevant" } else { "not relevant" };
        Decision::new(
            relevant,
            format!(
                "The snippet is {verdict}: its score {score} against threshold {}. {reason}",
                self.threshold
            ),
        )
    }
}

/// Relevant when the oracle judges it so.
pub struct JudgeDeterminer<'a> {
    oracle: &'a dyn DecisionOracle,
}

impl<'a> JudgeDeterminer<'a> {
    pub fn new(oracle: &'a dyn DecisionOracle) -> Self {
        Self { oracle }
    }
}

impl SnippetDeterminer for JudgeDeterminer<'_> {
    fn determine(&self, query: &str, snippet: &SnippetRange, content: &str) -> Decision<bool> {
        self.oracle.judge_snippet(query, snippet, content)
    }
}

pub fn create_determiner<'a>(
    kind: SnippetDeterminerKind,
    oracle: &'a dyn DecisionOracle,
    threshold: u8,
) -> Box<dyn SnippetDeterminer + 'a> {
    match kind {
        SnippetDeterminerKind::Scorer => Box::new(ScoreDeterminer::new(oracle, threshold)),
        SnippetDeterminerKind::Judge => Box::new(JudgeDeterminer::new(oracle)),
    }
}

/// Judges every chunk of a file, merged up to `snippet_size` lines.
pub struct EnumerativeFinder<'a> {
    repo: &'a Repository,
    determiner: Box<dyn SnippetDeterminer + 'a>,
    snippet_size: usize,
    num_threads: usize,
    cancel: CancellationToken,
}

impl<'a> EnumerativeFinder<'a> {
    pub fn new(
        repo: &'a Repository,
        determiner: Box<dyn SnippetDeterminer + 'a>,
        snippet_size: usize,
        num_threads: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            repo,
            determiner,
            snippet_size,
            num_threads: num_threads.max(1),
            cancel,
        }
    }

    fn determine(&self, query: &str, range: &SnippetRange) -> RetrievalResult<Option<FoundSnippet>> {
        if self.cancel.is_cancelled() {
            return Ok(None);
        }
        let content = self.repo.get_snippet_content(range, 0, true, true)?;
        let decision = self.determiner.determine(query, range, &content);
        crate::debug_event!("retrieval", "snippet determined", "{range}: {}", decision.value);
        Ok(decision.value.then(|| FoundSnippet {
            range: range.clone(),
            reason: decision.reason,
        }))
    }
}

impl SnippetFinder for EnumerativeFinder<'_> {
    fn find(&self, query: &str, file: &str) -> RetrievalResult<Vec<FoundSnippet>> {
        let ranges = self.repo.snippets_of_file_with_size(file, self.snippet_size)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build()?;
        let decided: Vec<Option<FoundSnippet>> = pool.install(|| {
            ranges
                .par_iter()
                .map(|range| self.determine(query, range))
                .collect::<RetrievalResult<_>>()
        })?;
        Ok(decided.into_iter().flatten().collect())
    }
}

/// Asks the oracle for one line range at a time, reading the file's preview
/// with the ranges accepted so far hidden.
pub struct PreviewFinder<'a> {
    repo: &'a Repository,
    oracle: &'a dyn DecisionOracle,
    determiner: Box<dyn SnippetDeterminer + 'a>,
    preview: &'a dyn PreviewProvider,
    cancel: CancellationToken,
}

impl<'a> PreviewFinder<'a> {
    pub fn new(
        repo: &'a Repository,
        oracle: &'a dyn DecisionOracle,
        determiner: Box<dyn SnippetDeterminer + 'a>,
        preview: &'a dyn PreviewProvider,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            repo,
            oracle,
            determiner,
            preview,
            cancel,
        }
    }

    fn check(
        &self,
        query: &str,
        file: &str,
        num_lines: usize,
        accepted: &[(usize, usize)],
        answer: &SnippetAnswer,
    ) -> Result<(), Violation> {
        if answer.is_stop() {
            return Ok(());
        }
        let (start, end) = (answer.start_line, answer.end_line);
        if start < 0 {
            return Err(Violation::new(prompts::negative_line("start_line", start)));
        }
        if end < 0 {
            return Err(Violation::new(prompts::negative_line("end_line", end)));
        }
        if end <= start {
            return Err(Violation::new(prompts::start_not_before_end(start, end)));
        }
        let (start, end) = (start.unsigned_abs() as usize, end.unsigned_abs() as usize);
        if start >= num_lines {
            return Err(Violation::new(prompts::line_out_of_file("start_line", answer.start_line, num_lines)));
        }
        // `end` is exclusive
        if end > num_lines {
            return Err(Violation::new(prompts::line_out_of_file("end_line", answer.end_line, num_lines)));
        }
        if accepted.contains(&(start, end)) {
            return Err(Violation::new(prompts::snippet_already_found(start, end)));
        }
        if let Some(&(by_start, by_end)) = accepted.iter().find(|(s, e)| *s <= start && end <= *e) {
            return Err(Violation::new(prompts::snippet_covered(start, end, by_start, by_end)));
        }

        let range = SnippetRange::new(file, start, end);
        let content = self
            .repo
            .get_snippet_content(&range, 0, true, true)
            .map_err(|e| Violation::new(e.to_string()))?;
        let decision = self.determiner.determine(query, &range, &content);
        if !decision.value {
            return Err(Violation::new(prompts::snippet_not_relevant(start, end, &decision.reason)));
        }
        Ok(())
    }
}

impl SnippetFinder for PreviewFinder<'_> {
    fn find(&self, query: &str, file: &str) -> RetrievalResult<Vec<FoundSnippet>> {
        let content = self.repo.get_file_content(file, false)?;
        let num_lines = line_count(&content);
        let preview = self.preview.preview(file, &content);

        let mut accepted: Vec<(usize, usize)> = Vec::new();
        let mut found = Vec::new();
        // Every acceptance adds lines or joins ranges, so this bounds the loop
        for _ in 0..num_lines.saturating_mul(2) {
            if self.cancel.is_cancelled() {
                break;
            }
            let reduced = reduce_preview(&preview, &accepted);
            let request = SnippetRequest {
                query,
                file,
                preview: &reduced,
                accepted: &accepted,
            };
            let check = |answer: &SnippetAnswer| self.check(query, file, num_lines, &accepted, answer);
            let decision = self.oracle.next_snippet(&request, &check);
            let Some((start, end)) = decision.value else {
                crate::debug_event!("retrieval", "snippet search done", "{file}: {}", decision.reason);
                break;
            };

            found.push(FoundSnippet {
                range: SnippetRange::new(file, start, end),
                reason: decision.reason,
            });
            accepted.push((start, end));
            accepted = merge_overlapping_intervals(&accepted, false);
        }
        Ok(found)
    }
}

pub struct FinderOptions {
    pub kind: SnippetFinderKind,
    pub snippet_size: usize,
    pub num_threads: usize,
}

pub fn create_finder<'a>(
    options: &FinderOptions,
    repo: &'a Repository,
    oracle: &'a dyn DecisionOracle,
    determiner: Box<dyn SnippetDeterminer + 'a>,
    preview: &'a dyn PreviewProvider,
    cancel: CancellationToken,
) -> Box<dyn SnippetFinder + 'a> {
    match options.kind {
        SnippetFinderKind::Enumerative => Box::new(EnumerativeFinder::new(
            repo,
            determiner,
            options.snippet_size,
            options.num_threads,
            cancel,
        )),
        SnippetFinderKind::Preview => Box::new(PreviewFinder::new(repo, oracle, determiner, preview, cancel)),
    }
}
