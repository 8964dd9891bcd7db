//! Shell-style path patterns.
//!
//! Patterns follow `fnmatch` semantics: `*` also matches `/`, and a leading
//! dot needs no literal match.

use glob::{MatchOptions, Pattern};

const FNMATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled list of patterns, matched with "any" semantics.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
    // Invalid patterns only ever match themselves
    literals: Vec<String>,
}

impl PatternSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut set = Self::default();
        for raw in patterns {
            let raw = raw.as_ref();
            match Pattern::new(raw) {
                Ok(pattern) => set.patterns.push(pattern),
                Err(e) => {
                    tracing::warn!(target: "repository", "Invalid pattern '{raw}': {e}");
                    set.literals.push(raw.to_string());
                }
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.literals.is_empty()
    }

    pub fn matches_any(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches_with(path, FNMATCH))
            || self.literals.iter().any(|l| l == path)
    }
}

/// True when no include patterns are given or `path` matches one of them.
pub fn is_included<S: AsRef<str>>(path: &str, includes: &[S]) -> bool {
    includes.is_empty() || PatternSet::new(includes).matches_any(path)
}

/// `fnmatch` of a single pattern.
pub fn fnmatch(path: &str, pattern: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(p) => p.matches_with(path, FNMATCH),
        Err(_) => path == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_crosses_separators() {
        assert!(fnmatch("src/app/tests/", "*/tests/"));
        assert!(fnmatch("a/b/c.py", "*.py"));
        assert!(!fnmatch("a/b/c.rs", "*.py"));
    }

    #[test]
    fn test_pattern_set() {
        let set = PatternSet::new(&["docs/*", "*.lock"]);
        assert!(set.matches_any("docs/readme.md"));
        assert!(set.matches_any("sub/Cargo.lock"));
        assert!(!set.matches_any("src/main.rs"));
        assert!(!set.is_empty());
    }

    #[test]
    fn test_empty_includes_match_everything() {
        let none: [&str; 0] = [];
        assert!(is_included("anything.rs", &none));
        assert!(is_included("src/a.rs", &["src/*"]));
        assert!(!is_included("lib/a.rs", &["src/*"]));
    }
}
