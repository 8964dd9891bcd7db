//! Exclusion policy for repository enumeration.
//!
//! A path is excluded when it is hidden, matches a caller pattern, or is
//! denylisted. Files are additionally excluded when oversized or binary, and
//! directories when they hold too many entries.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::pattern::PatternSet;
use crate::config::RepositoryConfig;

pub const EXCLUDED_DIRECTORY_NAMES: &[&str] = &[
    ".git",
    ".github",
    ".gitlab",
    "venv",
    "__pycache__",
    "node_modules",
    ".gradle",
    ".maven",
    ".mvn",
    ".idea",
    ".vscode",
    ".eclipse",
];

pub const EXCLUDED_FILE_NAMES: &[&str] = &["gradle-wrapper.properties", "local.properties"];

pub const EXCLUDED_SUFFIXES: &[&str] = &[
    ".min.js",
    ".min.js.map",
    ".min.css",
    ".min.css.map",
    ".tfstate",
    ".tfstate.backup",
    ".jar",
    ".ipynb",
    ".png",
    ".jpg",
    ".jpeg",
    ".download",
    ".gif",
    ".bmp",
    ".tiff",
    ".ico",
    ".mp3",
    ".wav",
    ".wma",
    ".ogg",
    ".flac",
    ".mp4",
    ".avi",
    ".mkv",
    ".mov",
    ".patch",
    ".patch.disabled",
    ".wmv",
    ".m4a",
    ".m4v",
    ".3gp",
    ".3g2",
    ".rm",
    ".swf",
    ".flv",
    ".iso",
    ".bin",
    ".tar",
    ".zip",
    ".7z",
    ".gz",
    ".bz",
    ".bz2",
    ".rar",
    ".pdf",
    ".doc",
    ".docx",
    ".xls",
    ".xlsx",
    ".ppt",
    ".pptx",
    ".svg",
    ".parquet",
    ".pyc",
    ".pub",
    ".pem",
    ".ttf",
    ".log",
];

const BINARY_PROBE_BLOCK: usize = 1024;

/// Decides which repository entries are visible.
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    excludes: PatternSet,
    exclude_hidden: bool,
    max_file_bytes: u64,
    max_files_per_directory: usize,
}

impl ExclusionPolicy {
    pub fn new(config: &RepositoryConfig, extra_excludes: &[String]) -> Self {
        let patterns: Vec<&String> = config.excludes.iter().chain(extra_excludes).collect();
        Self {
            excludes: PatternSet::new(&patterns),
            exclude_hidden: config.exclude_hidden,
            max_file_bytes: config.max_file_bytes,
            max_files_per_directory: config.max_files_per_directory,
        }
    }

    /// `relative` is the `/`-separated path below the repository root.
    pub fn should_exclude(&self, absolute: &Path, relative: &str, is_dir: bool) -> bool {
        let name = relative.rsplit('/').next().unwrap_or(relative);
        if self.exclude_hidden && name.starts_with('.') {
            return true;
        }
        if self.excludes.matches_any(relative)
            || (is_dir && self.excludes.matches_any(&format!("{relative}/")))
        {
            return true;
        }
        if is_dir {
            self.should_exclude_directory(absolute, name)
        } else {
            self.should_exclude_file(absolute, relative, name)
        }
    }

    fn should_exclude_directory(&self, absolute: &Path, name: &str) -> bool {
        if EXCLUDED_DIRECTORY_NAMES.contains(&name) {
            return true;
        }
        match std::fs::read_dir(absolute) {
            Ok(entries) => entries.count() > self.max_files_per_directory,
            Err(_) => true,
        }
    }

    fn should_exclude_file(&self, absolute: &Path, relative: &str, name: &str) -> bool {
        if EXCLUDED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            return true;
        }
        if EXCLUDED_FILE_NAMES.contains(&name) {
            return true;
        }
        let parent_name = relative
            .rsplit_once('/')
            .and_then(|(parent, _)| parent.rsplit('/').next());
        if parent_name.is_some_and(|parent| EXCLUDED_DIRECTORY_NAMES.contains(&parent)) {
            return true;
        }
        match std::fs::metadata(absolute) {
            Ok(meta) if meta.len() > self.max_file_bytes => return true,
            Ok(_) => {}
            Err(_) => return true,
        }
        is_binary(absolute).unwrap_or(true)
    }
}

/// A file is binary when any of its 1024-byte blocks contains a NUL byte.
pub fn is_binary(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    let mut block = [0u8; BINARY_PROBE_BLOCK];
    loop {
        let read = file.read(&mut block)?;
        if read == 0 {
            return Ok(false);
        }
        if block[..read].contains(&0) {
            return Ok(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn policy() -> ExclusionPolicy {
        ExclusionPolicy::new(&RepositoryConfig::default(), &["docs/*".to_string()])
    }

    #[test]
    fn test_hidden_and_denylisted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join(".env"), "A=1").unwrap();
        fs::write(root.join("app.min.js"), "x").unwrap();
        fs::write(root.join("local.properties"), "x").unwrap();

        let policy = policy();
        assert!(policy.should_exclude(&root.join(".env"), ".env", false));
        assert!(policy.should_exclude(&root.join("node_modules"), "node_modules", true));
        assert!(policy.should_exclude(&root.join("app.min.js"), "app.min.js", false));
        assert!(policy.should_exclude(&root.join("local.properties"), "local.properties", false));
    }

    #[test]
    fn test_caller_patterns() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("docs/guide.md"), "guide").unwrap();
        fs::write(root.join("main.py"), "print(1)").unwrap();

        let policy = policy();
        assert!(policy.should_exclude(&root.join("docs/guide.md"), "docs/guide.md", false));
        assert!(!policy.should_exclude(&root.join("main.py"), "main.py", false));
    }

    #[test]
    fn test_binary_and_oversized_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("blob.dat"), [b'a', 0, b'b']).unwrap();
        fs::write(root.join("big.txt"), "x".repeat(240_001)).unwrap();
        fs::write(root.join("ok.txt"), "x".repeat(240_000)).unwrap();

        let policy = policy();
        assert!(policy.should_exclude(&root.join("blob.dat"), "blob.dat", false));
        assert!(policy.should_exclude(&root.join("big.txt"), "big.txt", false));
        assert!(!policy.should_exclude(&root.join("ok.txt"), "ok.txt", false));
    }

    #[test]
    fn test_crowded_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("crowded")).unwrap();
        for i in 0..101 {
            fs::write(root.join(format!("crowded/f{i}.txt")), "x").unwrap();
        }
        fs::create_dir_all(root.join("fine")).unwrap();
        fs::write(root.join("fine/a.txt"), "x").unwrap();

        let policy = policy();
        assert!(policy.should_exclude(&root.join("crowded"), "crowded", true));
        assert!(!policy.should_exclude(&root.join("fine"), "fine", true));
    }
}
