//! Retrieval orchestrator.

use indexmap::IndexSet;
use rayon::prelude::*;
use std::cmp::Reverse;

use super::cancel::CancellationToken;
use super::error::RetrievalResult;
use super::explore::FileExplorer;
use super::interval::merge_overlapping_intervals;
use super::report::{Retrieval, StageTimer};
use super::snippets::{FinderOptions, SnippetFinder, create_determiner, create_finder};
use crate::config::RetrievalConfig;
use crate::oracle::answer::check_score_range;
use crate::oracle::{ChooseAnswer, DecisionOracle, Violation, prompts};
use crate::preview::PreviewProvider;
use crate::repository::{KeywordSearcher, Repository, SimilarityFinder, SnippetProvider};
use crate::types::SnippetRange;

/// Candidates shown to the oracle per `choose_files` request.
const CHOOSE_BATCH_SIZE: usize = 30;

pub struct Retriever<'a> {
    repo: &'a Repository,
    oracle: &'a dyn DecisionOracle,
    preview: &'a dyn PreviewProvider,
    config: RetrievalConfig,
    includes: Vec<String>,
    cancel: CancellationToken,
}

/// Deduplicate keeping first occurrences.
fn dedup(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}

impl<'a> Retriever<'a> {
    pub fn new(
        repo: &'a Repository,
        oracle: &'a dyn DecisionOracle,
        preview: &'a dyn PreviewProvider,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            repo,
            oracle,
            preview,
            config,
            includes: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Restrict candidate files to those matching any of the shell patterns.
    pub fn with_includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn worker_pool(&self) -> RetrievalResult<rayon::ThreadPool> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.num_threads.max(1))
            .build()?)
    }

    /// Run every stage; with `files_only` stop after scoring file previews.
    ///
    /// Items are relevant files, or relevant snippets as `path:start-end`.
    /// When cancelled, the stages left are skipped and the last stage's
    /// output is returned.
    pub fn retrieve(&self, query: &str, files_only: bool) -> RetrievalResult<Retrieval> {
        let mut retrieval = Retrieval::default();
        crate::log_event!("retrieval", "started", "{}", self.repo.full_name());

        let timer = StageTimer::start("EDL");
        let edl = self.lookup_entity_definitions(query);
        retrieval.stages.push(timer.finish(&edl));

        let timer = StageTimer::start("KWS");
        let kws = self.search_keyword_engine(query, &edl)?;
        retrieval.stages.push(timer.finish(&kws));

        let starting = dedup(edl.iter().chain(&kws).cloned());
        if self.stop_early(&mut retrieval, &starting) {
            return Ok(retrieval);
        }

        let timer = StageTimer::start("FTE");
        let fte = self.explore_file_tree(query, &starting);
        retrieval.stages.push(timer.finish(&fte));

        let candidates = dedup(starting.into_iter().chain(fte));
        if self.stop_early(&mut retrieval, &candidates) {
            return Ok(retrieval);
        }

        let timer = StageTimer::start("FPS");
        let plausible = self.score_files_by_preview(query, &candidates)?;
        retrieval.stages.push(timer.finish(&plausible));

        if files_only || self.stop_early(&mut retrieval, &plausible) {
            retrieval.items = plausible;
            return Ok(retrieval);
        }

        let timer = StageTimer::start("SCR");
        let snippets: Vec<String> = self
            .find_relevant_snippets(query, &plausible)?
            .iter()
            .map(ToString::to_string)
            .collect();
        retrieval.stages.push(timer.finish(&snippets));

        retrieval.items = dedup(snippets);
        retrieval.cancelled = self.cancel.is_cancelled();
        Ok(retrieval)
    }

    fn stop_early(&self, retrieval: &mut Retrieval, found: &[String]) -> bool {
        if !self.cancel.is_cancelled() {
            return false;
        }
        tracing::warn!(target: "retrieval", "cancelled; returning {} item(s) found so far", found.len());
        retrieval.items = found.to_vec();
        retrieval.cancelled = true;
        true
    }

    /// EDL: files named in the query, confirmed by the oracle.
    pub fn lookup_entity_definitions(&self, query: &str) -> Vec<String> {
        let names = self.oracle.extract_file_names(query);
        crate::debug_event!("retrieval", "file names", "{:?}: {}", names.value, names.reason);

        let similar: Vec<String> = names
            .value
            .iter()
            .flat_map(|name| {
                self.repo
                    .find_similar_files(name, self.config.edl_file_limit, &self.includes)
            })
            .collect();
        if similar.is_empty() {
            tracing::info!(target: "retrieval", "no plausible definition files");
            return Vec::new();
        }

        let mut chosen: IndexSet<String> = IndexSet::new();
        for batch in similar.chunks(CHOOSE_BATCH_SIZE) {
            if self.cancel.is_cancelled() {
                break;
            }
            let check = |answer: &ChooseAnswer| match answer.choose_list.iter().find(|f| !batch.contains(f)) {
                Some(file) => Err(Violation::new(prompts::file_not_in_list(file, batch))),
                None => Ok(()),
            };
            let decision = self.oracle.choose_files(query, batch, &check);
            crate::debug_event!("retrieval", "chose files", "{:?}: {}", decision.value, decision.reason);
            chosen.extend(decision.value);
        }
        chosen.into_iter().collect()
    }

    /// KWS: best keyword matches not already found by EDL.
    pub fn search_keyword_engine(&self, query: &str, skipping: &[String]) -> RetrievalResult<Vec<String>> {
        let files = self
            .repo
            .search_files(query, Some(self.config.kws_file_limit), &self.includes)?;
        Ok(files.into_iter().filter(|f| !skipping.contains(f)).collect())
    }

    /// FTE: more files found by walking the tree around `starting`.
    pub fn explore_file_tree(&self, query: &str, starting: &[String]) -> Vec<String> {
        FileExplorer {
            repo: self.repo,
            oracle: self.oracle,
            includes: &self.includes,
            strategy: self.config.fte_strategy,
            going_upward: self.config.fte_going_upward,
            file_limit: self.config.fte_file_limit,
            max_tree_size: self.config.fte_max_file_tree_size,
            cancel: self.cancel.clone(),
        }
        .explore(query, starting)
    }

    fn score_file(&self, query: &str, file: &str, files: &[String]) -> RetrievalResult<u8> {
        if self.cancel.is_cancelled() {
            return Ok(0);
        }
        let content = self.repo.get_file_content(file, false)?;
        let preview = self.preview.preview(file, &content);
        let others: Vec<String> = files.iter().filter(|f| *f != file).cloned().collect();
        let decision = self
            .oracle
            .score_preview(query, file, &preview, &others, &check_score_range);
        tracing::info!(target: "retrieval", "file {file} scored {}: {}", decision.value, decision.reason);
        Ok(decision.value)
    }

    /// FPS: files whose preview scores at least the threshold, best first.
    pub fn score_files_by_preview(&self, query: &str, files: &[String]) -> RetrievalResult<Vec<String>> {
        let pool = self.worker_pool()?;
        let scores: Vec<u8> = pool.install(|| {
            files
                .par_iter()
                .map(|file| self.score_file(query, file, files))
                .collect::<RetrievalResult<_>>()
        })?;

        let mut scored: Vec<(&String, u8)> = files
            .iter()
            .zip(scores)
            .filter(|(_, score)| *score >= self.config.fps_preview_score_threshold)
            .collect();
        scored.sort_by_key(|(_, score)| Reverse(*score));
        Ok(scored.into_iter().map(|(file, _)| file.clone()).collect())
    }

    fn snippet_finder(&self) -> Box<dyn SnippetFinder + '_> {
        let determiner = create_determiner(
            self.config.scr_snippet_determiner,
            self.oracle,
            self.config.scr_snippet_score_threshold,
        );
        let options = FinderOptions {
            kind: self.config.scr_snippet_finder,
            snippet_size: self.config.scr_snippet_size,
            num_threads: self.config.scr_num_threads,
        };
        create_finder(
            &options,
            self.repo,
            self.oracle,
            determiner,
            self.preview,
            self.cancel.clone(),
        )
    }

    /// SCR: relevant snippets of each file, continuous ones joined.
    pub fn find_relevant_snippets(&self, query: &str, files: &[String]) -> RetrievalResult<Vec<SnippetRange>> {
        let finder = self.snippet_finder();
        let pool = self.worker_pool()?;
        let per_file: Vec<Vec<SnippetRange>> = pool.install(|| {
            files
                .par_iter()
                .map(|file| -> RetrievalResult<Vec<SnippetRange>> {
                    if self.cancel.is_cancelled() {
                        return Ok(Vec::new());
                    }
                    let found = finder.find(query, file)?;
                    for snippet in &found {
                        tracing::info!(target: "retrieval", "snippet {}: {}", snippet.range, snippet.reason);
                    }
                    let ranges: Vec<(usize, usize)> = found.iter().map(|s| (s.range.start, s.range.end)).collect();
                    Ok(merge_overlapping_intervals(&ranges, true)
                        .into_iter()
                        .map(|(start, end)| SnippetRange::new(file.as_str(), start, end))
                        .collect())
                })
                .collect::<RetrievalResult<_>>()
        })?;
        Ok(per_file.into_iter().flatten().collect())
    }
}
