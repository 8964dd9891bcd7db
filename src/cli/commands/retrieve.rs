//! Retrieve command - run the full retrieval pipeline.

use anyhow::Context;

use crate::cli::args::RepoArgs;
use crate::cli::commands::open_repository;
use crate::cli::output::Envelope;
use crate::config::Settings;
use crate::oracle::{LlmOracle, create_chat_model};
use crate::preview::create_preview;
use crate::retrieval::{Retrieval, Retriever};

pub struct RetrieveOptions<'a> {
    pub query: &'a str,
    pub files_only: bool,
    pub includes: Vec<String>,
    pub model: Option<String>,
    pub threads: Option<usize>,
    pub json: bool,
}

/// Run the retrieve command.
pub fn run(args: &RepoArgs, options: RetrieveOptions<'_>, settings: &Settings) -> anyhow::Result<()> {
    let mut settings = settings.clone();
    if let Some(model) = options.model {
        settings.oracle.model = model;
    }
    if let Some(threads) = options.threads {
        settings.retrieval.num_threads = threads;
    }

    let repo = open_repository(args, &settings)?;
    let chat = create_chat_model(&settings.oracle).context("Cannot create the chat backend")?;
    let oracle = LlmOracle::new(chat, repo.full_name(), settings.oracle.max_rounds);
    let preview = create_preview(&settings.preview);

    let retriever = Retriever::new(&repo, &oracle, preview.as_ref(), settings.retrieval.clone())
        .with_includes(options.includes);
    let retrieval = retriever.retrieve(options.query, options.files_only)?;

    if options.json {
        return emit_json(options.query, retrieval);
    }
    for stage in &retrieval.stages {
        eprintln!("{}: {} item(s) in {}ms", stage.name, stage.output.len(), stage.elapsed_ms);
    }
    if retrieval.items.is_empty() {
        println!("Nothing relevant found");
    }
    for item in &retrieval.items {
        println!("{item}");
    }
    Ok(())
}

fn emit_json(query: &str, retrieval: Retrieval) -> anyhow::Result<()> {
    let elapsed_ms = retrieval.stages.iter().map(|s| s.elapsed_ms).sum();
    if retrieval.items.is_empty() {
        return Envelope::<Retrieval>::not_found("retrieve", "Nothing relevant found")
            .with_query(query)
            .with_duration_ms(elapsed_ms)
            .emit();
    }
    let count = retrieval.items.len();
    Envelope::success("retrieve", retrieval)
        .with_count(count)
        .with_query(query)
        .with_duration_ms(elapsed_ms)
        .emit()
}
