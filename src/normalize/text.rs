//! Header and sentence cleanup.
//!
//! Truncation is a hard cut at the word limit. Sentences additionally drop a
//! trailing fragment after the last sentence terminator when the cut leaves one.
//! Text without a single letter or digit (`----`, `...`) counts as blank.

use super::{content_lines, strip_wrapping};
use crate::error::NormalizationError;

const LABELS: [&str; 6] = ["title:", "header:", "heading:", "summary:", "sentence:", "answer:"];

/// Join all content lines into one line with single spaces.
fn collapse(raw: &str) -> String {
    content_lines(raw)
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_label(text: &str) -> &str {
    for label in LABELS {
        let matches = text
            .get(..label.len())
            .map(|prefix| prefix.eq_ignore_ascii_case(label))
            .unwrap_or(false);
        if matches {
            return text[label.len()..].trim_start();
        }
    }
    text
}

fn strip_heading_marker(text: &str) -> &str {
    let trimmed = text.trim_start_matches(['#', '=']).trim_start();
    for level in 1..=6 {
        let marker = format!("h{}.", level);
        if let Some(rest) = trimmed.strip_prefix(marker.as_str()) {
            return rest.trim_start();
        }
    }
    trimmed
}

/// Keep at most `limit` words. Returns the kept text and whether anything was cut.
pub fn truncate_words(text: &str, limit: usize) -> (String, bool) {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        (words.join(" "), false)
    } else {
        (words[..limit].join(" "), true)
    }
}

fn has_content(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Byte offset of the last `.`, `!` or `?` that ends a sentence, i.e. is followed
/// by whitespace or the end of the text. `2.5` and `v1.2` do not count.
fn last_sentence_end(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    let mut last = None;
    while let Some((index, c)) = chars.next() {
        let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if matches!(c, '.' | '!' | '?') && at_boundary {
            last = Some(index);
        }
    }
    last
}

fn clean(raw: &str) -> String {
    let collapsed = collapse(raw);
    let unlabelled = strip_label(strip_wrapping(&collapsed));
    strip_wrapping(unlabelled).to_string()
}

pub fn header(raw: &str, word_limit: usize) -> Result<String, NormalizationError> {
    let cleaned = clean(raw);
    let cleaned = strip_wrapping(strip_heading_marker(&cleaned)).to_string();
    let (kept, _) = truncate_words(&cleaned, word_limit);
    let title = kept
        .trim_end_matches(['.', ',', ';', ':', '!', '?', '-'])
        .trim_end()
        .to_string();
    if !has_content(&title) {
        return Err(NormalizationError::Blank);
    }
    Ok(title)
}

pub fn sentence(raw: &str, word_limit: usize) -> Result<String, NormalizationError> {
    let cleaned = clean(raw);
    let (kept, truncated) = truncate_words(&cleaned, word_limit);
    let text = if truncated {
        match last_sentence_end(&kept) {
            Some(end) if end > 0 => kept[..=end].to_string(),
            _ => kept,
        }
    } else {
        kept
    };
    if !has_content(&text) {
        return Err(NormalizationError::Blank);
    }
    Ok(text)
}
