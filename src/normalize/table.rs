//! Table cleanup: split the response into titled sub-tables, keep well-formed rows,
//! renumber steps, and re-emit in the template's markup.

use super::content_lines;
use crate::error::NormalizationError;
use crate::prompts::TableParams;
use crate::template::Markup;

/// One parsed sub-table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTable {
    pub title: Option<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse, validate and re-emit tables.
pub fn tables(raw: &str, params: &TableParams, markup: Markup) -> Result<String, NormalizationError> {
    let tables: Vec<SubTable> = parse_tables(raw, &params.headers)
        .into_iter()
        .filter(|table| !table.rows.is_empty())
        .take(params.table_limit)
        .collect();
    if tables.is_empty() {
        return Err(NormalizationError::NoTableRows);
    }
    Ok(tables
        .iter()
        .map(|table| render_table(table, &params.headers, markup))
        .collect::<Vec<_>>()
        .join("\n\n"))
}

/// Split raw text into sub-tables. Rows whose cell count differs from
/// `headers.len()` are dropped; leading step numbers are renumbered from 1.
pub fn parse_tables(raw: &str, headers: &[String]) -> Vec<SubTable> {
    let mut tables = Vec::new();
    let mut current = SubTable {
        title: None,
        rows: Vec::new(),
    };

    for line in content_lines(raw) {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_noise(trimmed) {
            continue;
        }
        if trimmed.starts_with('|') || trimmed.starts_with("a|") {
            let cells = split_row(trimmed);
            if is_header_row(&cells, headers) {
                continue;
            }
            if cells.len() != headers.len() {
                tracing::debug!(
                    expected = headers.len(),
                    found = cells.len(),
                    row = trimmed,
                    "Dropping malformed table row"
                );
                continue;
            }
            current.rows.push(cells);
        } else {
            if !current.rows.is_empty() {
                tables.push(std::mem::replace(
                    &mut current,
                    SubTable {
                        title: None,
                        rows: Vec::new(),
                    },
                ));
            }
            current.title = Some(clean_title(trimmed));
        }
    }
    if !current.rows.is_empty() || current.title.is_some() {
        tables.push(current);
    }

    for table in &mut tables {
        renumber_steps(table);
    }
    tables
}

fn is_noise(line: &str) -> bool {
    line.starts_with("|===")
        || line.starts_with("||")
        || (line.starts_with('[') && line.ends_with(']'))
        || is_separator_row(line)
}

/// Markdown alignment rows like `|---|:---:|`.
fn is_separator_row(line: &str) -> bool {
    line.contains('-') && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' ' | '+'))
}

fn split_row(line: &str) -> Vec<String> {
    let line = line.strip_prefix('a').unwrap_or(line);
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    let raw_cells: Vec<&str> = line.split('|').collect();
    let last = raw_cells.len().saturating_sub(1);
    raw_cells
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            // `|x a|y`: the `a` is the AsciiDoc style prefix of the next cell
            let cell = if index < last {
                cell.strip_suffix(" a").unwrap_or(cell)
            } else {
                cell
            };
            cell.trim().to_string()
        })
        .collect()
}

fn is_header_row(cells: &[String], headers: &[String]) -> bool {
    cells.len() == headers.len()
        && cells
            .iter()
            .zip(headers)
            .all(|(cell, header)| cell.trim_matches('*').eq_ignore_ascii_case(header))
}

fn clean_title(line: &str) -> String {
    let mut title = line.trim_start_matches(['#', '=', '.']).trim();
    for level in 1..=6 {
        let marker = format!("h{}.", level);
        if let Some(rest) = title.strip_prefix(marker.as_str()) {
            title = rest.trim();
        }
    }
    let title = super::strip_wrapping(title);
    title.trim_end_matches(':').trim().to_string()
}

fn is_step_number(cell: &str) -> bool {
    let digits = cell.trim_end_matches(['.', ')']);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Numbered steps become 1, 2, 3, ...; sub-steps such as `3a` keep their label.
fn renumber_steps(table: &mut SubTable) {
    let mut step = 0;
    for row in &mut table.rows {
        if let Some(first) = row.first_mut() {
            if is_step_number(first) {
                step += 1;
                *first = step.to_string();
            }
        }
    }
}

fn render_table(table: &SubTable, headers: &[String], markup: Markup) -> String {
    let mut lines = Vec::new();
    match markup {
        Markup::Jira => {
            if let Some(title) = &table.title {
                lines.push(format!("*{}*", title));
            }
            lines.push(format!("||{}||", headers.join("||")));
            for row in &table.rows {
                lines.push(format!("|{}|", row.join("|")));
            }
        }
        Markup::Markdown => {
            if let Some(title) = &table.title {
                lines.push(format!("**{}**", title));
                lines.push(String::new());
            }
            lines.push(format!("| {} |", headers.join(" | ")));
            lines.push(format!(
                "| {} |",
                headers.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
            ));
            for row in &table.rows {
                lines.push(format!("| {} |", row.join(" | ")));
            }
        }
        Markup::AsciiDoc => {
            if let Some(title) = &table.title {
                lines.push(format!("===== {}", title));
            }
            lines.push("[options=\"header\"]".to_string());
            lines.push("|===".to_string());
            lines.push(
                headers
                    .iter()
                    .map(|header| format!("|{}", header))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            for row in &table.rows {
                lines.push(
                    row.iter()
                        .map(|cell| format!("|{}", cell))
                        .collect::<Vec<_>>()
                        .join(" "),
                );
            }
            lines.push("|===".to_string());
        }
    }
    lines.join("\n")
}
