//! Bullet and numbered list cleanup.
//!
//! Models add their own markers despite being told not to; those are stripped so
//! the re-emitted list carries exactly one marker in the template's markup.

use super::content_lines;
use crate::error::NormalizationError;
use crate::template::Markup;
use regex::Regex;
use std::sync::LazyLock;

static MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*•+#.–]+|\(?\d{1,3}[.)]|[a-zA-Z][.)])(?:\s+|$)")
        .expect("Invalid list marker regex")
});

/// Split a raw response into list items, markers stripped.
///
/// When at least one line carried a marker, unmarked lines are treated as
/// preamble or commentary and dropped.
pub fn parse_items(raw: &str) -> Vec<String> {
    let mut items: Vec<(bool, String)> = Vec::new();
    for line in content_lines(raw) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let (marked, content) = match MARKER_REGEX.find(trimmed) {
            Some(marker) => (true, &trimmed[marker.end()..]),
            None => (false, trimmed),
        };
        let content = content
            .trim()
            .trim_end_matches(" +")
            .trim_end()
            .to_string();
        if content.is_empty() {
            continue;
        }
        items.push((marked, content));
    }

    let any_marked = items.iter().any(|(marked, _)| *marked);
    items
        .into_iter()
        .filter(|(marked, _)| *marked || !any_marked)
        .map(|(_, content)| content)
        .collect()
}

pub fn bullets(raw: &str, limit: usize, markup: Markup) -> Result<String, NormalizationError> {
    let items = capped(raw, limit)?;
    let marker = match markup {
        Markup::Jira | Markup::AsciiDoc => "*",
        Markup::Markdown => "-",
    };
    Ok(items
        .iter()
        .map(|item| format!("{} {}", marker, item))
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn numbered(raw: &str, limit: usize, markup: Markup) -> Result<String, NormalizationError> {
    let items = capped(raw, limit)?;
    Ok(items
        .iter()
        .enumerate()
        .map(|(index, item)| match markup {
            Markup::Jira => format!("# {}", item),
            Markup::Markdown => format!("{}. {}", index + 1, item),
            Markup::AsciiDoc => format!(". {}", item),
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

fn capped(raw: &str, limit: usize) -> Result<Vec<String>, NormalizationError> {
    let mut items = parse_items(raw);
    if items.is_empty() {
        return Err(NormalizationError::NoItems);
    }
    items.truncate(limit);
    Ok(items)
}
