use anyhow::anyhow;
use clap::Parser;

use coderecall::cli::commands::{self, retrieve::RetrieveOptions};
use coderecall::cli::{Cli, Commands};
use coderecall::config::Settings;
use coderecall::logging;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Init must work before any configuration exists
    if let Commands::Init { force } = cli.command {
        return commands::init::run_init(force);
    }

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow!("Failed to load configuration: {e}"))?;
    if cli.verbose {
        settings.logging.default = "info".to_string();
    }
    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Index { repo, force, json } => commands::index::run_index(&repo, force, json, &settings),
        Commands::Search {
            repo,
            query,
            limit,
            includes,
            files,
            json,
        } => commands::index::run_search(&repo, &query, limit, &includes, files, json, &settings),
        Commands::Tree {
            repo,
            includes,
            max_lines,
        } => commands::index::run_tree(&repo, &includes, max_lines, &settings),
        Commands::Retrieve {
            repo,
            query,
            files_only,
            includes,
            model,
            threads,
            json,
        } => commands::retrieve::run(
            &repo,
            RetrieveOptions {
                query: &query,
                files_only,
                includes,
                model,
                threads,
                json,
            },
            &settings,
        ),
    }
}
