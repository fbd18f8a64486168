//! Response normalizer: turns raw model text into a value that is safe to drop into a template.
//!
//! One cleanup routine per strategy. Failures are reported as `NormalizationError`
//! and end up as a per-placeholder failure, never as a hard stop.

use crate::error::NormalizationError;
use crate::prompts::Strategy;
use crate::template::Markup;

pub mod list;
pub mod selection;
pub mod table;
pub mod text;

pub fn normalize(strategy: &Strategy, raw: &str, markup: Markup) -> Result<String, NormalizationError> {
    match strategy {
        Strategy::Header(params) => text::header(raw, params.word_limit),
        Strategy::Sentence(params) => text::sentence(raw, params.word_limit),
        Strategy::Bullets(params) => list::bullets(raw, params.limit, markup),
        Strategy::Numbered(params) => list::numbered(raw, params.limit, markup),
        Strategy::Selection(params) => selection::select(raw, params),
        Strategy::Table(params) => table::tables(raw, params, markup),
    }
}

/// Lines of `raw` with code-fence lines (```` ``` ````, `~~~`) removed.
pub(crate) fn content_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().filter(|line| {
        let trimmed = line.trim_start();
        !trimmed.starts_with("```") && !trimmed.starts_with("~~~")
    })
}

const QUOTE_PAIRS: [(char, char); 6] = [
    ('"', '"'),
    ('\'', '\''),
    ('`', '`'),
    ('\u{201c}', '\u{201d}'),
    ('\u{2018}', '\u{2019}'),
    ('\u{ab}', '\u{bb}'),
];

/// Remove quotes or emphasis markers wrapping the whole string, repeatedly.
pub(crate) fn strip_wrapping(text: &str) -> &str {
    let mut current = text.trim();
    loop {
        let before = current;
        for wrapper in ["**", "__", "*", "_"] {
            if current.len() > 2 * wrapper.len()
                && current.starts_with(wrapper)
                && current.ends_with(wrapper)
            {
                current = current[wrapper.len()..current.len() - wrapper.len()].trim();
            }
        }
        for (open, close) in QUOTE_PAIRS {
            let mut chars = current.chars();
            if current.chars().count() >= 2
                && chars.next() == Some(open)
                && chars.next_back() == Some(close)
            {
                current = current[open.len_utf8()..current.len() - close.len_utf8()].trim();
            }
        }
        if current == before {
            return current;
        }
    }
}
