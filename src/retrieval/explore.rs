//! File tree exploration.
//!
//! The repository's file tree is narrowed to the neighborhood of the files
//! found so far, shrunk when it exceeds the budget, and shown to the oracle,
//! which names one more relevant file per turn.

use indexmap::IndexSet;

use super::FteStrategy;
use super::cancel::CancellationToken;
use crate::filetree::FileTree;
use crate::oracle::{DecisionOracle, NextFileAnswer, Violation, prompts};
use crate::repository::{Repository, SimilarityFinder};

const TEST_DIRECTORY_PATTERNS: &[&str] = &["test/", "tests/", "*/test/", "*/tests/"];
const SIMILAR_FILES_SHOWN: usize = 5;

/// Directory `levels` above `file`, with a trailing `/`; `/` for the root.
pub fn upward_directory(file: &str, levels: usize) -> String {
    let mut current = file.trim_end_matches('/');
    for _ in 0..levels {
        match current.rsplit_once('/') {
            Some((parent, _)) => current = parent,
            None => return "/".to_string(),
        }
    }
    format!("{current}/")
}

/// Distinct upward directories of `files`, without those nested in another.
pub fn upward_directories<S: AsRef<str>>(files: &[S], levels: usize) -> Vec<String> {
    let mut dirs: Vec<String> = files
        .iter()
        .map(|file| upward_directory(file.as_ref(), levels))
        .map(|dir| if dir == "/" { dir } else { format!("/{dir}") })
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect();
    // Sorted, every directory follows the one it is nested in
    dirs.sort();

    let mut outermost: Vec<String> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if !outermost.last().is_some_and(|outer| dir.starts_with(outer.as_str())) {
            outermost.push(dir);
        }
    }
    outermost
        .into_iter()
        .map(|dir| match dir.strip_prefix('/') {
            Some("") | None => "/".to_string(),
            Some(relative) => relative.to_string(),
        })
        .collect()
}

/// Each file plus those of its ancestor directories deeper than half its depth.
pub fn heuristic_keep<S: AsRef<str>>(files: &[S]) -> Vec<String> {
    let mut keep = Vec::new();
    for file in files {
        let file = file.as_ref();
        let parts: Vec<&str> = file.split('/').collect();
        let depth = parts.len();
        for idx in (depth / 2 + 1)..depth {
            keep.push(format!("{}/", parts[..idx].join("/")));
        }
        keep.push(file.to_string());
    }
    keep
}

pub struct FileExplorer<'a> {
    pub repo: &'a Repository,
    pub oracle: &'a dyn DecisionOracle,
    pub includes: &'a [String],
    pub strategy: FteStrategy,
    pub going_upward: usize,
    pub file_limit: usize,
    pub max_tree_size: usize,
    pub cancel: CancellationToken,
}

impl FileExplorer<'_> {
    /// Files found by exploring the tree around `starting`.
    pub fn explore(&self, query: &str, starting: &[String]) -> Vec<String> {
        if self.strategy == FteStrategy::Disabled {
            tracing::info!(target: "retrieval", "file tree exploration disabled");
            return Vec::new();
        }

        let mut tree = FileTree::parse(&self.repo.render_file_tree(self.includes));
        if !starting.is_empty() {
            tree.reset();
            if self.going_upward > 0 {
                let dirs = upward_directories(starting, self.going_upward);
                crate::debug_event!("retrieval", "reshape upward", "{dirs:?}");
                tree.keep_only(&dirs);
            } else {
                tree.keep_only(&heuristic_keep(starting));
            }
        }

        if tree.current_size() > self.max_tree_size {
            tracing::info!(
                target: "retrieval",
                "file tree has {} lines, over the budget of {}",
                tree.current_size(),
                self.max_tree_size
            );
            if self.strategy == FteStrategy::FilesThenDirsTryShrinking {
                self.shrink(query, &mut tree);
            }
            if tree.current_size() > self.max_tree_size {
                tracing::info!(target: "retrieval", "giving up file tree exploration");
                return Vec::new();
            }
        }

        self.find_files(query, &tree.render(false), starting)
    }

    fn shrink(&self, query: &str, tree: &mut FileTree) {
        let test_dirs: Vec<String> = TEST_DIRECTORY_PATTERNS
            .iter()
            .flat_map(|pattern| tree.find(pattern, true))
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        if query.to_lowercase().contains("test") {
            if !test_dirs.is_empty() {
                crate::debug_event!("retrieval", "keeping test directories", "{}", test_dirs.len());
                tree.keep_only(&test_dirs);
            }
        } else {
            crate::debug_event!("retrieval", "collapsing test directories", "{}", test_dirs.len());
            tree.collapse_directories(&test_dirs);
        }

        tree.collapse_innermost_directories_until(self.max_tree_size);
        tree.collapse_empty_directories();
        crate::debug_event!("retrieval", "shrunk file tree", "{} lines", tree.current_size());
    }

    fn check(&self, found: &[String], answer: &NextFileAnswer) -> Result<(), Violation> {
        let Some(file) = answer.file.as_deref() else {
            return Ok(());
        };
        if !self.repo.has_file(file) {
            let similar = self.repo.find_similar_files(file, SIMILAR_FILES_SHOWN, self.includes);
            return Err(Violation::new(prompts::file_not_exists(file, &similar)));
        }
        if found.iter().any(|f| f == file) {
            return Err(Violation::new(prompts::file_already_found(file)));
        }
        Ok(())
    }

    fn find_files(&self, query: &str, tree: &str, starting: &[String]) -> Vec<String> {
        let mut found: Vec<String> = starting.to_vec();
        let mut explored = Vec::new();
        while explored.len() < self.file_limit && !self.cancel.is_cancelled() {
            let check = |answer: &NextFileAnswer| self.check(&found, answer);
            let decision = self.oracle.next_file(query, tree, &found, &check);
            let Some(file) = decision.value else {
                tracing::info!(target: "retrieval", "file tree exploration done: {}", decision.reason);
                break;
            };
            tracing::info!(target: "retrieval", "explored file {file}: {}", decision.reason);
            found.push(file.clone());
            explored.push(file);
        }
        explored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upward_directory() {
        assert_eq!(upward_directory("a/b/c/d.py", 2), "a/b/");
        assert_eq!(upward_directory("a/b.py", 1), "a/");
        assert_eq!(upward_directory("a/b.py", 2), "/");
        assert_eq!(upward_directory("b.py", 1), "/");
    }

    #[test]
    fn test_upward_directories_drop_nested() {
        let files = ["src/net/http/client.rs", "src/net/server.rs", "srcx/lib.rs/x/y.rs", "docs/a/b.md"];
        assert_eq!(
            upward_directories(&files, 2),
            vec!["docs/", "src/", "srcx/lib.rs/"]
        );
        assert_eq!(upward_directories(&["a.py", "src/x/y.py"], 2), vec!["/"]);
    }

    #[test]
    fn test_heuristic_keep() {
        assert_eq!(
            heuristic_keep(&["a/b/c/d/e.py"]),
            vec!["a/b/c/", "a/b/c/d/", "a/b/c/d/e.py"]
        );
        assert_eq!(heuristic_keep(&["main.rs"]), vec!["main.rs"]);
    }
}
