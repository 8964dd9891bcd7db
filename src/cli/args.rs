//! CLI argument parsing using clap.

use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Code context retrieval for language models
#[derive(Parser, Debug)]
#[command(
    name = "coderecall",
    version = env!("CARGO_PKG_VERSION"),
    about = "Retrieve the files and snippets of a repository relevant to a query",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Repository selection shared by the repository commands.
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Repository as `org/name:path`, or just a path
    #[arg(value_name = "REPO")]
    pub repo: String,

    /// Extra exclusion patterns (shell style, matched against paths)
    #[arg(long, value_delimiter = ',')]
    pub excludes: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .coderecall/settings.toml with default configuration
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display the active settings
    Config,

    /// Build and persist the keyword index of a repository
    Index {
        #[command(flatten)]
        repo: RepoArgs,

        /// Rebuild even when a cached index exists
        #[arg(short, long)]
        force: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rank snippets by BM25 only, without a language model
    #[command(after_help = "Examples:\n  coderecall search . -q \"how does login work\"\n  coderecall search acme/app:./app -q token --includes 'src/*' --json")]
    Search {
        #[command(flatten)]
        repo: RepoArgs,

        /// Query text
        #[arg(short, long)]
        query: String,

        /// Maximum number of snippets
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Only consider paths matching these patterns
        #[arg(long, value_delimiter = ',')]
        includes: Vec<String>,

        /// Search files instead of snippets
        #[arg(long)]
        files: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the repository's file tree
    Tree {
        #[command(flatten)]
        repo: RepoArgs,

        /// Only list files matching these patterns
        #[arg(long, value_delimiter = ',')]
        includes: Vec<String>,

        /// Collapse directories until at most this many lines remain
        #[arg(long)]
        max_lines: Option<usize>,
    },

    /// Run the full retrieval pipeline
    #[command(after_help = "Examples:\n  coderecall retrieve . -q \"where are sessions expired?\"\n  coderecall retrieve acme/app:./app -q \"fix the login bug\" --files-only --json")]
    Retrieve {
        #[command(flatten)]
        repo: RepoArgs,

        /// Query text
        #[arg(short, long)]
        query: String,

        /// Stop after scoring file previews
        #[arg(long)]
        files_only: bool,

        /// Only consider paths matching these patterns
        #[arg(long, value_delimiter = ',')]
        includes: Vec<String>,

        /// Chat backend as `provider:model` (overrides config)
        #[arg(long)]
        model: Option<String>,

        /// Worker threads (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Output as JSON, including per-stage reports
        #[arg(long)]
        json: bool,
    },
}
