//! Document assembler: literal, single-pass substitution of generated values.
//!
//! Values are inserted as plain text. Placeholder delimiters inside a value are
//! broken apart, and value lines that would open or close a literal block are
//! escaped, so the rendered document never contains new placeholders.

use crate::generation::{GenerationResult, ResultStatus};
use crate::template::{is_fence_line, scan, Markup, Segment, TemplateDocument};
use std::collections::HashMap;

/// Marker left in the document where a placeholder could not be filled.
pub fn sentinel(placeholder: &str) -> String {
    format!("[[MISSING: {}]]", placeholder)
}

/// Break up `{{` and `}}` so inserted text cannot be read back as a placeholder.
pub fn neutralize_delimiters(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous: Option<char> = None;
    for c in value.chars() {
        if (c == '{' || c == '}') && previous == Some(c) {
            out.push(' ');
        }
        out.push(c);
        previous = Some(c);
    }
    out
}

/// Escape value lines that are block delimiters in `markup` (`----`, ```` ``` ````, `{code}`, ...).
pub fn escape_fence_lines(value: &str, markup: Markup) -> String {
    let mut out = String::with_capacity(value.len());
    for line in value.split_inclusive('\n') {
        if is_fence_line(line, markup) {
            out.push('\\');
        }
        out.push_str(line);
    }
    out
}

/// Render a template from per-placeholder results. Missing or failed entries
/// become sentinel markers.
pub fn render(template: &TemplateDocument, results: &HashMap<String, GenerationResult>) -> String {
    render_with(template, |name| {
        results.get(name).and_then(|result| match result.status {
            ResultStatus::Ok => Some(result.value.as_str()),
            ResultStatus::Failed(_) => None,
        })
    })
}

/// Render a template from a plain name → value map.
pub fn render_values(template: &TemplateDocument, values: &HashMap<String, String>) -> String {
    render_with(template, |name| values.get(name).map(String::as_str))
}

fn render_with<'a, F>(template: &TemplateDocument, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.raw_text.len());
    for segment in scan(&template.raw_text, template.markup) {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Placeholder(name) => match lookup(name) {
                Some(value) => {
                    let value = escape_fence_lines(value, template.markup);
                    out.push_str(&neutralize_delimiters(&value));
                }
                None => out.push_str(&sentinel(name)),
            },
        }
    }
    out
}
