//! Fuzzy path matching.
//!
//! `ratio` is rapidfuzz's normalized Indel similarity scaled to `[0, 100]`;
//! `partial_ratio` is the best `ratio` of the shorter string against any
//! equally long window of the longer one.

use rapidfuzz::fuzz;

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    100.0 * fuzz::ratio(a.iter().copied(), b.iter().copied())
}

pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let n = short.len();
    let mut best: f64 = 0.0;
    // Windows that hang over either end of the longer string
    for k in 1..n {
        best = best.max(ratio_chars(&short, &long[..k]));
        best = best.max(ratio_chars(&short, &long[long.len() - k..]));
    }
    for window in long.windows(n) {
        best = best.max(ratio_chars(&short, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Rank `candidates` by similarity to the final path component of `query`.
///
/// The first `limit` results come from the full-string ranking, where a
/// candidate containing the name verbatim gets a bonus of 101; the partial
/// ranking then contributes its first `limit` entries not already present.
pub fn find_similar<S: AsRef<str>>(query: &str, candidates: &[S], limit: usize) -> Vec<String> {
    let name = query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(query);

    let mut full: Vec<(f64, &str)> = candidates
        .iter()
        .map(|c| {
            let c = c.as_ref();
            let bonus = if c.contains(name) { 101.0 } else { 0.0 };
            (ratio(name, c) + bonus, c)
        })
        .collect();
    full.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut partial: Vec<(f64, &str)> = candidates
        .iter()
        .map(|c| (partial_ratio(name, c.as_ref()), c.as_ref()))
        .collect();
    partial.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut similar: Vec<String> = full.iter().take(limit).map(|(_, c)| c.to_string()).collect();
    for (_, candidate) in partial.iter().take(limit) {
        if !similar.iter().any(|s| s == candidate) {
            similar.push(candidate.to_string());
        }
    }
    similar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio() {
        assert_eq!(ratio("abc", "abc"), 100.0);
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
        // One deletion apart: 2 * 7 common of 15 characters
        assert!((ratio("utils.py", "util.py") - 1400.0 / 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_ratio() {
        assert_eq!(partial_ratio("utils.py", "src/utils.py"), 100.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
        assert!(partial_ratio("config", "src/cfg.rs") < 100.0);
    }

    #[test]
    fn test_find_similar_prefers_exact_name() {
        let candidates = ["src/utils.py", "src/util.py", "README.md"];
        let similar = find_similar("utils.py", &candidates, 10);
        assert_eq!(similar[0], "src/utils.py");
        assert_eq!(similar.len(), 3);
    }

    #[test]
    fn test_find_similar_uses_basename_of_query() {
        let candidates = ["lib/auth/login.rs", "lib/auth/logout.rs", "lib/db.rs"];
        let similar = find_similar("some/other/dir/login.rs", &candidates, 1);
        assert_eq!(similar[0], "lib/auth/login.rs");
        // The partial ranking may add at most one more entry
        assert!(similar.len() <= 2);
    }
}
