//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod index;
pub mod init;
pub mod retrieve;

use anyhow::Context;
use std::path::PathBuf;

use crate::cli::args::RepoArgs;
use crate::config::Settings;
use crate::repository::Repository;
use crate::types::RepoRef;

/// Org used for repositories given as a bare path.
const LOCAL_ORG: &str = "local";

/// Parse `org/name:path`, or a bare path named after its directory.
pub fn parse_repo(spec: &str) -> RepoRef {
    if let Ok(repo) = spec.parse::<RepoRef>() {
        return repo;
    }
    let path = PathBuf::from(spec);
    let name = path
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "repository".to_string());
    RepoRef::new(LOCAL_ORG, name, path)
}

/// Open the repository selected on the command line.
pub fn open_repository(args: &RepoArgs, settings: &Settings) -> anyhow::Result<Repository> {
    let repo = parse_repo(&args.repo);
    let repository = Repository::open(repo, settings)
        .with_context(|| format!("Cannot open repository '{}'", args.repo))?;
    Ok(repository.with_excludes(&args.excludes, settings))
}
