//! Selection cleanup: map the model's answer back onto the configured options.
//!
//! Every token in the answer must match an option, otherwise the placeholder
//! fails. The emitted value is always the literal option text.

use super::{content_lines, strip_wrapping};
use crate::error::NormalizationError;
use crate::prompts::SelectionParams;

/// Option text with bracketed annotations removed, e.g. `Must (release blocker)` -> `Must`.
fn without_annotations(option: &str) -> String {
    let mut out = String::with_capacity(option.len());
    let mut depth = 0usize;
    for c in option.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_token(token: &str) -> String {
    let token = token
        .trim()
        .trim_start_matches(['-', '*', '•'])
        .trim()
        .trim_end_matches(['.', '!']);
    strip_wrapping(token)
        .trim_end_matches(['.', '!'])
        .trim()
        .to_lowercase()
}

fn exact_option<'a>(token: &str, options: &'a [String]) -> Option<&'a String> {
    let token = clean_token(token);
    options.iter().find(|option| option.to_lowercase() == token)
}

/// Find the option a token refers to.
///
/// Order: exact (case-insensitive, with or without annotations), then the longest
/// option contained in the token, then the single option containing the token.
pub fn match_option<'a>(token: &str, options: &'a [String]) -> Option<&'a String> {
    let token = clean_token(token);
    if token.is_empty() {
        return None;
    }

    let candidates: Vec<(&String, String, String)> = options
        .iter()
        .map(|option| {
            (
                option,
                option.to_lowercase(),
                without_annotations(option).to_lowercase(),
            )
        })
        .collect();

    if let Some((option, _, _)) = candidates
        .iter()
        .find(|(_, full, bare)| *full == token || (!bare.is_empty() && *bare == token))
    {
        return Some(option);
    }

    if let Some((option, _, _)) = candidates
        .iter()
        .filter(|(_, _, bare)| !bare.is_empty() && token.contains(bare.as_str()))
        .max_by_key(|(_, _, bare)| bare.len())
    {
        return Some(option);
    }

    if token.chars().count() >= 3 {
        let containing: Vec<&String> = candidates
            .iter()
            .filter(|(_, full, _)| full.contains(token.as_str()))
            .map(|(option, _, _)| *option)
            .collect();
        if containing.len() == 1 {
            return Some(containing[0]);
        }
    }
    None
}

pub fn select(raw: &str, params: &SelectionParams) -> Result<String, NormalizationError> {
    let mut chosen: Vec<&String> = Vec::new();

    for line in content_lines(raw) {
        if line.trim().is_empty() {
            continue;
        }
        let matched: Vec<&String> = match exact_option(line, &params.options) {
            Some(option) => vec![option],
            None => line
                .split([',', ';'])
                .filter(|piece| !piece.trim().is_empty())
                .map(|piece| {
                    match_option(piece, &params.options)
                        .ok_or_else(|| NormalizationError::UnknownOption(piece.trim().to_string()))
                })
                .collect::<Result<_, _>>()?,
        };
        for option in matched {
            if !chosen.contains(&option) {
                chosen.push(option);
            }
        }
    }

    if chosen.is_empty() {
        return Err(NormalizationError::Blank);
    }
    chosen.truncate(params.max_selections);
    Ok(chosen
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", "))
}
