//! Fixed-width splitter with optional overlap.

use super::ChunkSplitter;
use std::ops::Range;

/// Cuts text into windows of at most `width` bytes that end on whitespace.
/// A byte bound is also a character bound.
pub struct FixedSplitter {
    width: usize,
    overlap: usize,
}

impl FixedSplitter {
    pub fn new(width: usize, overlap: usize) -> Self {
        Self { width, overlap }
    }
}

impl ChunkSplitter for FixedSplitter {
    fn split(&self, text: &str) -> Vec<Range<usize>> {
        fixed_windows(text, self.width, self.overlap)
    }
}

/// Windows of at most `width` bytes, backed off to the last whitespace.
///
/// A single token wider than `width` is kept whole. Consecutive windows
/// share roughly `overlap` bytes, rounded to whole tokens, so their ranges
/// may intersect.
fn fixed_windows(text: &str, width: usize, overlap: usize) -> Vec<Range<usize>> {
    let width = width.max(1);
    let mut windows = Vec::new();
    let mut start = skip_whitespace(text, 0);

    while start < text.len() {
        let end = window_end(text, start, width);

        let window = text[start..end].trim_end();
        if !window.is_empty() {
            windows.push(start..start + window.len());
        }

        if end >= text.len() {
            break;
        }

        let mut next = end;
        if overlap > 0 {
            next = end.saturating_sub(overlap).max(start + 1);
            while next < end && !text.is_char_boundary(next) {
                next += 1;
            }
            // Resume at a token start, not inside one
            if !preceded_by_whitespace(text, next) {
                next = text[next..]
                    .find(char::is_whitespace)
                    .map_or(text.len(), |i| next + i);
            }
        }

        next = skip_whitespace(text, next);
        if next <= start {
            next = skip_whitespace(text, end);
        }
        start = next;
    }

    windows
}

fn window_end(text: &str, start: usize, width: usize) -> usize {
    let mut end = (start + width).min(text.len());
    while end > start && !text.is_char_boundary(end) {
        end -= 1;
    }

    if end >= text.len() || text[end..].starts_with(char::is_whitespace) {
        return end.max(next_boundary(text, start));
    }

    match text[start..end].rfind(char::is_whitespace) {
        Some(ws) if ws > 0 => start + ws,
        // One token fills the window: keep it whole
        _ => text[start..]
            .find(char::is_whitespace)
            .map_or(text.len(), |i| start + i),
    }
}

fn next_boundary(text: &str, start: usize) -> usize {
    text[start..]
        .chars()
        .next()
        .map_or(text.len(), |c| start + c.len_utf8())
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    let rest = &text[from..];
    from + (rest.len() - rest.trim_start().len())
}

fn preceded_by_whitespace(text: &str, at: usize) -> bool {
    text[..at].chars().next_back().map_or(true, char::is_whitespace)
}
