//! Result snippets: a window of text around the first query-term hit

use std::collections::BTreeSet;

use crate::analysis::{Analyzer, Term};

const ELLIPSIS: char = '…';

/// Build a snippet of at most `window` chars (plus ellipses) from `text`
///
/// The window is centered on the first token whose analyzed term is in
/// `terms`; without a hit the text is truncated from the start.
pub fn build_snippet(analyzer: &Analyzer, text: &str, terms: &BTreeSet<Term>, window: usize) -> String {
    if window == 0 || text.is_empty() {
        return String::new();
    }

    let hit = if terms.is_empty() {
        None
    } else {
        analyzer.tokens(text).find(|token| terms.contains(&token.term))
    };

    match hit {
        Some(token) => window_around(text, token.start, token.end, window),
        None => truncate_chars(text, window),
    }
}

/// Window of `window` chars around the byte range `start..end`
fn window_around(text: &str, start: usize, end: usize, window: usize) -> String {
    let total = text.chars().count();
    if total <= window {
        return text.to_string();
    }

    let hit_start = text[..start].chars().count();
    let hit_len = text[start..end].chars().count();
    let context = window.saturating_sub(hit_len.min(window)) / 2;
    let from = hit_start.saturating_sub(context).min(total - window);
    let to = from + window;

    let mut out = String::with_capacity(window + 8);
    if from > 0 {
        out.push(ELLIPSIS);
    }
    out.extend(text.chars().skip(from).take(window));
    if to < total {
        out.push(ELLIPSIS);
    }
    out
}

fn truncate_chars(text: &str, window: usize) -> String {
    match text.char_indices().nth(window) {
        Some((cut, _)) => {
            let mut out = text[..cut].to_string();
            out.push(ELLIPSIS);
            out
        }
        None => text.to_string(),
    }
}
