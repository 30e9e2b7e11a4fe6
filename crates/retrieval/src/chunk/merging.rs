//! Absorption of undersized chunks into their neighbours.

use std::ops::Range;

/// Fold every range shorter than `min_chunk_size` characters into its
/// predecessor.
///
/// A short first range is folded into the one after it. Merging spans
/// the source text between the two ranges, so content shared by
/// overlapping windows appears once and nothing is dropped. The receiving
/// chunk may exceed the maximum size.
pub fn absorb_undersized(
    text: &str,
    ranges: Vec<Range<usize>>,
    min_chunk_size: usize,
) -> Vec<Range<usize>> {
    let undersized = |range: &Range<usize>| text[range.clone()].chars().count() < min_chunk_size;
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());

    for range in ranges {
        match merged.last_mut() {
            Some(previous) if undersized(&range) => {
                previous.end = previous.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }

    if merged.len() > 1 && undersized(&merged[0]) {
        let first = merged.remove(0);
        merged[0].start = first.start;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str, ranges: Vec<Range<usize>>) -> Vec<&str> {
        ranges.into_iter().map(|range| &text[range]).collect()
    }

    #[test]
    fn test_trailing_remainder_is_appended() {
        let text = format!("{} {} tail", "x".repeat(50), "y".repeat(50));
        let merged = absorb_undersized(&text, vec![0..50, 51..101, 102..106], 20);

        assert_eq!(merged.len(), 2);
        assert!(texts(&text, merged)[1].ends_with("y tail"));
    }

    #[test]
    fn test_short_first_chunk_merges_forward() {
        let text = format!("hi\n\n{}", "z".repeat(40));
        let merged = absorb_undersized(&text, vec![0..2, 4..44], 10);

        assert_eq!(texts(&text, merged), vec![text.as_str()]);
    }

    #[test]
    fn test_single_short_chunk_is_kept() {
        let merged = absorb_undersized("tiny", vec![0..4], 100);
        assert_eq!(merged, vec![0..4]);
    }

    #[test]
    fn test_overlapping_tail_is_not_repeated() {
        let text = "alpha beta gamma delta epsilon";
        // "gamma delta" is shared by both windows
        let merged = absorb_undersized(text, vec![0..22, 11..30], 20);
        assert_eq!(texts(text, merged), vec![text]);
    }

    #[test]
    fn test_size_counts_characters() {
        // 6 characters in 9 bytes
        let text = format!("{} ação é", "x".repeat(10));
        let merged = absorb_undersized(&text, vec![0..10, 11..text.len()], 6);
        assert_eq!(merged.len(), 2);
    }
}
