/// Merge half-open intervals `[start, end)` that overlap.
///
/// Touching intervals such as `[30, 50)` and `[50, 60)` stay apart unless
/// `merge_continuous` is set. Empty intervals are dropped. The result is
/// sorted by start.
pub fn merge_overlapping_intervals(intervals: &[(usize, usize)], merge_continuous: bool) -> Vec<(usize, usize)> {
    let mut sorted: Vec<(usize, usize)> = intervals.iter().copied().filter(|(s, e)| s < e).collect();
    sorted.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match merged.last_mut() {
            Some(last) if start < last.1 || (merge_continuous && start == last.1) => {
                last.1 = last.1.max(end);
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_intervals() {
        assert_eq!(merge_overlapping_intervals(&[(10, 20), (20, 30)], true), vec![(10, 30)]);
        assert_eq!(
            merge_overlapping_intervals(&[(10, 20), (20, 30)], false),
            vec![(10, 20), (20, 30)]
        );
    }

    #[test]
    fn test_overlapping_and_nested() {
        assert_eq!(
            merge_overlapping_intervals(&[(40, 45), (0, 10), (5, 15), (2, 3)], false),
            vec![(0, 15), (40, 45)]
        );
        assert_eq!(merge_overlapping_intervals(&[(3, 3), (1, 2)], true), vec![(1, 2)]);
        assert!(merge_overlapping_intervals(&[], true).is_empty());
    }
}
