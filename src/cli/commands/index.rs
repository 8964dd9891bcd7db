//! Index, Search and Tree commands.

use serde::Serialize;
use std::time::Instant;

use crate::cli::args::RepoArgs;
use crate::cli::commands::open_repository;
use crate::cli::output::Envelope;
use crate::config::Settings;
use crate::filetree::FileTree;
use crate::keyword::{KeywordEngine, ScoredSnippet};
use crate::repository::KeywordSearcher;

#[derive(Debug, Serialize)]
struct IndexSummary {
    repository: String,
    files: usize,
    snippets: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_file: Option<String>,
}

/// Run index command - build the keyword index and persist it.
pub fn run_index(args: &RepoArgs, force: bool, json: bool, settings: &Settings) -> anyhow::Result<()> {
    let start = Instant::now();
    let repo = open_repository(args, settings)?;
    let engine = if force {
        repo.rebuild_keyword_engine()?
    } else {
        repo.keyword_engine()?
    };
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let summary = IndexSummary {
        repository: repo.full_name(),
        files: repo.list_files().len(),
        snippets: engine.snippets().len(),
        cache_file: Some(
            KeywordEngine::cache_file(&settings.keyword_index_dir(), repo.repo())
                .display()
                .to_string(),
        ),
    };

    if json {
        return Envelope::success("index", summary)
            .with_duration_ms(elapsed_ms)
            .emit();
    }
    println!(
        "Indexed {} snippets of {} files in {} ({elapsed_ms}ms)",
        summary.snippets, summary.files, summary.repository
    );
    if let Some(cache_file) = summary.cache_file {
        println!("Keyword index saved to: {cache_file}");
    }
    Ok(())
}

/// Run search command - rank snippets or files by BM25.
pub fn run_search(
    args: &RepoArgs,
    query: &str,
    limit: usize,
    includes: &[String],
    files: bool,
    json: bool,
    settings: &Settings,
) -> anyhow::Result<()> {
    let repo = open_repository(args, settings)?;

    if files {
        let found = repo.search_files(query, Some(limit), includes)?;
        if json {
            let count = found.len();
            return Envelope::success("search", found)
                .with_count(count)
                .with_query(query)
                .emit();
        }
        if found.is_empty() {
            println!("No matching files");
        }
        for file in found {
            println!("{file}");
        }
        return Ok(());
    }

    let found: Vec<ScoredSnippet> = repo
        .search_snippets(query, Some(limit), includes)?
        .into_iter()
        .filter(|s| s.score > 0.0)
        .collect();
    if json {
        if found.is_empty() {
            return Envelope::<Vec<ScoredSnippet>>::not_found("search", "No snippet matches the query")
                .with_query(query)
                .emit();
        }
        let count = found.len();
        return Envelope::success("search", found)
            .with_count(count)
            .with_query(query)
            .emit();
    }
    if found.is_empty() {
        println!("No snippet matches the query");
    }
    for scored in found {
        println!("{:.4}  {}", scored.score, scored.snippet);
    }
    Ok(())
}

/// Run tree command - print the (optionally shrunk) file tree.
pub fn run_tree(
    args: &RepoArgs,
    includes: &[String],
    max_lines: Option<usize>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let repo = open_repository(args, settings)?;
    let listing = repo.render_file_tree(includes);
    let Some(budget) = max_lines else {
        print!("{listing}");
        return Ok(());
    };

    let mut tree = FileTree::parse(&listing);
    tree.collapse_innermost_directories_until(budget);
    tree.collapse_empty_directories();
    println!("{}", tree.render(false));
    Ok(())
}
