//! Line-oriented file tree with visibility toggling.
//!
//! The tree is parsed from the indentation listing produced by
//! [`Repository::render_file_tree`](crate::repository::Repository::render_file_tree):
//! two spaces per level, directories as their full path ending in `/`, files
//! by name. Lines are kept in a flat arena and each one records the index of
//! its parent directory line. Every operation besides [`FileTree::reset`] acts
//! on the currently visible lines only.

mod analysis;

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashSet};

use crate::repository::pattern::fnmatch;
use analysis::AnalysisTree;

const INDENT: &str = "  ";
const ROOT_DIR: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeLine {
    pub depth: usize,
    /// Text as listed: a full path for directories, a bare name for files
    pub text: String,
    pub parent: Option<usize>,
    pub is_dir: bool,
    pub visible: bool,
    path: String,
}

impl FileTreeLine {
    /// Repository-relative path; directories end with `/`.
    pub fn full_path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileTree {
    lines: Vec<FileTreeLine>,
}

impl FileTree {
    /// Parse an indentation listing.
    pub fn parse(listing: &str) -> Self {
        let mut lines: Vec<FileTreeLine> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();

        for raw in listing.trim().split('\n') {
            let text = raw.trim();
            if text.is_empty() {
                continue;
            }
            let indent = raw.len() - raw.trim_start().len();
            let depth = indent / INDENT.len();

            while stack.last().is_some_and(|&top| lines[top].depth >= depth) {
                stack.pop();
            }
            let parent = stack.last().copied();
            let is_dir = text.ends_with('/');
            let path = match parent {
                Some(parent) if !is_dir => format!("{}{text}", lines[parent].path),
                _ => text.to_string(),
            };

            if is_dir {
                stack.push(lines.len());
            }
            lines.push(FileTreeLine {
                depth,
                text: text.to_string(),
                parent,
                is_dir,
                visible: true,
                path,
            });
        }

        Self { lines }
    }

    pub fn lines(&self) -> &[FileTreeLine] {
        &self.lines
    }

    fn visible(&self) -> impl Iterator<Item = (usize, &FileTreeLine)> {
        self.lines.iter().enumerate().filter(|(_, line)| line.visible)
    }

    fn parent_path(&self, line: &FileTreeLine) -> Option<&str> {
        line.parent.map(|parent| self.lines[parent].full_path())
    }

    /// Make exactly the lines in `mask` visible.
    fn show_only(&mut self, mask: &[bool]) {
        for (line, &show) in self.lines.iter_mut().zip(mask) {
            line.visible = show;
        }
    }

    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.visible = true;
        }
    }

    pub fn current_size(&self) -> usize {
        self.visible().count()
    }

    pub fn complete_size(&self) -> usize {
        self.lines.len()
    }

    /// Visible full paths matching the shell pattern.
    pub fn find(&self, pattern: &str, dirs_only: bool) -> Vec<String> {
        self.visible()
            .filter(|(_, line)| !dirs_only || line.is_dir)
            .filter(|(_, line)| fnmatch(line.full_path(), pattern))
            .map(|(_, line)| line.full_path().to_string())
            .collect()
    }

    pub fn includes_file(&self, path: &str) -> bool {
        self.visible()
            .any(|(_, line)| !line.is_dir && line.full_path() == path)
    }

    pub fn includes_directory(&self, path: &str) -> bool {
        self.visible()
            .any(|(_, line)| line.is_dir && line.full_path() == path)
    }

    /// Render visible lines; directories show their last path component.
    pub fn render(&self, skip_files: bool) -> String {
        self.visible()
            .filter(|(_, line)| !skip_files || line.is_dir)
            .map(|(_, line)| {
                let text = if line.is_dir {
                    let name = line.text.trim_end_matches('/');
                    format!("{}/", name.rsplit('/').next().unwrap_or(name))
                } else {
                    line.text.clone()
                };
                format!("{}{text}", INDENT.repeat(line.depth))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Keep visible lines under any of `paths`, with their ancestor chains,
    /// plus the direct children of requested directories. `/` resets.
    pub fn keep_only<S: AsRef<str>>(&mut self, paths: &[S]) {
        let paths: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();
        if paths.contains(&ROOT_DIR) {
            self.reset();
            return;
        }

        let mut keep = vec![false; self.lines.len()];
        for (index, line) in self.visible() {
            if paths.iter().any(|p| line.full_path().starts_with(p)) {
                keep[index] = true;
                let mut ancestor = line.parent;
                while let Some(parent) = ancestor {
                    if keep[parent] {
                        break;
                    }
                    keep[parent] = true;
                    ancestor = self.lines[parent].parent;
                }
            } else if self.parent_path(line).is_some_and(|parent| paths.contains(&parent)) {
                keep[index] = true;
            }
        }
        self.show_only(&keep);
    }

    /// Show the direct children of each directory (`/` for the root) along
    /// with the directory's own ancestor chain, on top of what is visible.
    pub fn expand_directories<S: AsRef<str>>(&mut self, dirs: &[S]) {
        let dirs: HashSet<String> = dirs.iter().map(|d| with_trailing_slash(d.as_ref())).collect();
        let ancestors: HashSet<&str> = dirs
            .iter()
            .flat_map(|dir| dir.match_indices('/').map(|(i, _)| &dir[..=i]))
            .collect();
        let expand_root = dirs.contains(ROOT_DIR);

        let keep: Vec<bool> = self
            .lines
            .iter()
            .map(|line| match self.parent_path(line) {
                None if expand_root => true,
                Some(parent) if dirs.iter().any(|d| parent.starts_with(d.as_str())) => true,
                // Every `/`-terminated prefix, the directory itself included
                _ if ancestors.contains(line.full_path()) => true,
                _ => line.visible,
            })
            .collect();
        self.show_only(&keep);
    }

    /// Hide each directory and everything listed below it.
    pub fn collapse_directories<S: AsRef<str>>(&mut self, dirs: &[S]) {
        let dirs: HashSet<String> = dirs.iter().map(|d| with_trailing_slash(d.as_ref())).collect();
        let visible: Vec<usize> = self.visible().map(|(index, _)| index).collect();

        let mut cursor = 0;
        while cursor < visible.len() {
            let line = &self.lines[visible[cursor]];
            cursor += 1;
            if !line.is_dir || !dirs.contains(line.full_path()) {
                continue;
            }
            let depth = line.depth;
            self.lines[visible[cursor - 1]].visible = false;
            while cursor < visible.len() && self.lines[visible[cursor]].depth > depth {
                self.lines[visible[cursor]].visible = false;
                cursor += 1;
            }
        }
    }

    fn analysis_tree(&self) -> AnalysisTree {
        AnalysisTree::build(
            self.visible()
                .map(|(index, line)| (index, line.depth, line.is_dir)),
        )
    }

    /// Hide whole innermost directories until at most `budget` lines are visible.
    ///
    /// Candidates are leaf directories and parents of leaf files; deeper ones
    /// go first, then those with fewer children. The synthetic root is the
    /// parent of top-level files and comes last: choosing it hides every
    /// remaining line.
    pub fn collapse_innermost_directories_until(&mut self, budget: usize) {
        let mut size = self.current_size();
        if size <= budget {
            return;
        }

        let mut tree = self.analysis_tree();
        let mut candidates: Vec<usize> = Vec::new();
        while size > budget {
            if candidates.is_empty() {
                candidates = innermost_candidates(&tree);
            }
            let Some(chosen) = candidates.pop() else {
                tracing::debug!(target: "filetree", "no directory left to collapse at {size} lines");
                break;
            };
            for index in tree.subtree_lines(chosen) {
                if self.lines[index].visible {
                    self.lines[index].visible = false;
                    size -= 1;
                }
            }
            tree.detach(chosen);
        }
    }

    /// Hide directories left without any visible content.
    pub fn collapse_empty_directories(&mut self) {
        let mut tree = self.analysis_tree();
        loop {
            let empty: Vec<usize> = tree
                .leaves()
                .into_iter()
                .filter(|&id| tree.node(id).is_dir)
                .collect();
            if empty.is_empty() {
                break;
            }
            for id in empty {
                if let Some(index) = tree.node(id).line {
                    self.lines[index].visible = false;
                }
                tree.detach(id);
            }
        }
    }
}

/// Innermost directories ordered so that the next one to collapse is last.
fn innermost_candidates(tree: &AnalysisTree) -> Vec<usize> {
    let mut candidates = BTreeSet::new();
    for leaf in tree.leaves() {
        let node = tree.node(leaf);
        if node.is_dir {
            candidates.insert(leaf);
        } else if let Some(parent) = node.parent {
            candidates.insert(parent);
        }
    }

    let mut candidates: Vec<usize> = candidates.into_iter().collect();
    candidates.sort_by_key(|&id| {
        let node = tree.node(id);
        (node.depth * 1_000_000 - node.children.len() as isize, Reverse(id))
    });
    candidates
}

fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
README.md
src/
  main.rs
  src/net/
    client.rs
    server.rs
  src/util/
    fmt.rs
tests/
  net_test.rs
";

    fn visible_paths(tree: &FileTree) -> Vec<&str> {
        tree.lines()
            .iter()
            .filter(|l| l.visible)
            .map(|l| l.full_path())
            .collect()
    }

    #[test]
    fn test_parse_paths_and_parents() {
        let tree = FileTree::parse(LISTING);
        assert_eq!(tree.complete_size(), 10);
        let paths: Vec<_> = tree.lines().iter().map(|l| l.full_path()).collect();
        assert_eq!(
            paths,
            vec![
                "README.md",
                "src/",
                "src/main.rs",
                "src/net/",
                "src/net/client.rs",
                "src/net/server.rs",
                "src/util/",
                "src/util/fmt.rs",
                "tests/",
                "tests/net_test.rs",
            ]
        );
        assert_eq!(tree.lines()[4].parent, Some(3));
        assert_eq!(tree.lines()[0].parent, None);
    }

    #[test]
    fn test_render_uses_last_component() {
        let tree = FileTree::parse(LISTING);
        assert_eq!(
            tree.render(true),
            "src/\n  net/\n  util/\ntests/"
        );
        assert!(tree.render(false).starts_with("README.md\nsrc/\n  main.rs\n  net/\n    client.rs"));
    }

    #[test]
    fn test_find_and_includes() {
        let tree = FileTree::parse(LISTING);
        assert_eq!(tree.find("*/net/", true), vec!["src/net/"]);
        assert_eq!(tree.find("*net*", false).len(), 4);
        assert!(tree.includes_file("src/util/fmt.rs"));
        assert!(!tree.includes_file("src/util/"));
        assert!(tree.includes_directory("src/util/"));
    }

    #[test]
    fn test_keep_only_then_reset() {
        let mut tree = FileTree::parse(LISTING);
        tree.keep_only(&["src/net/"]);
        assert_eq!(
            visible_paths(&tree),
            vec!["src/", "src/net/", "src/net/client.rs", "src/net/server.rs"]
        );
        tree.reset();
        assert_eq!(tree.current_size(), tree.complete_size());

        tree.keep_only(&["/"]);
        assert_eq!(tree.current_size(), tree.complete_size());
    }

    #[test]
    fn test_keep_only_file_keeps_ancestors() {
        let mut tree = FileTree::parse(LISTING);
        tree.keep_only(&["src/util/fmt.rs", "tests/"]);
        assert_eq!(
            visible_paths(&tree),
            vec!["src/", "src/util/", "src/util/fmt.rs", "tests/", "tests/net_test.rs"]
        );
    }

    #[test]
    fn test_expand_directories() {
        let mut tree = FileTree::parse(LISTING);
        tree.keep_only(&["tests/"]);
        tree.expand_directories(&["src/util"]);
        assert_eq!(
            visible_paths(&tree),
            vec!["src/", "src/util/", "src/util/fmt.rs", "tests/", "tests/net_test.rs"]
        );

        tree.expand_directories(&["/"]);
        assert!(tree.includes_file("README.md"));
    }

    #[test]
    fn test_collapse_directories() {
        let mut tree = FileTree::parse(LISTING);
        tree.collapse_directories(&["src/net", "tests/"]);
        assert_eq!(
            visible_paths(&tree),
            vec!["README.md", "src/", "src/main.rs", "src/util/", "src/util/fmt.rs"]
        );
    }

    #[test]
    fn test_collapse_innermost_prefers_deepest() {
        let mut tree = FileTree::parse(LISTING);
        tree.collapse_innermost_directories_until(6);
        assert!(tree.current_size() <= 6);
        assert!(tree.includes_file("README.md"));
        assert!(!tree.includes_directory("src/util/"));
    }

    #[test]
    fn test_collapse_innermost_hides_top_level_files_last() {
        let mut tree = FileTree::parse("a.rs\nb.rs\nc.rs\n");
        tree.collapse_innermost_directories_until(1);
        assert_eq!(tree.current_size(), 0);

        let mut tree = FileTree::parse("src/\n  a.py\n  b.py\nc.rs\nd.rs\ne.rs\nf.rs\ng.rs\nh.rs\n");
        tree.collapse_innermost_directories_until(8);
        assert_eq!(tree.current_size(), 6);
        assert!(!tree.includes_directory("src/"));
        assert!(tree.includes_file("h.rs"));

        tree.reset();
        tree.collapse_innermost_directories_until(3);
        assert!(tree.current_size() <= 3);
    }

    #[test]
    fn test_collapse_empty_directories() {
        let mut tree = FileTree::parse("docs/\n  docs/api/\n    docs/api/v1/\nsrc/\n  lib.rs\n");
        tree.collapse_empty_directories();
        assert_eq!(visible_paths(&tree), vec!["src/", "src/lib.rs"]);
    }
}
