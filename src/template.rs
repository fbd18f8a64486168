//! Template catalog: loads document templates and finds their placeholders.
//!
//! Placeholders use `{{ name }}` syntax. Anything inside fenced code blocks,
//! AsciiDoc listing/literal blocks, Jira `{code}`/`{noformat}` blocks or inline
//! backtick spans is literal example text and is never treated as a placeholder.

use crate::error::GenerationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

static PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("Invalid placeholder regex")
});

const TEMPLATE_EXTENSIONS: [&str; 3] = ["md", "adoc", "txt"];

/// Kinds of document the generator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentType {
    Epic,
    Story,
    Adoc,
    Docs,
    #[value(name = "use-case", alias = "use_case", alias = "usecase")]
    UseCase,
}

impl DocumentType {
    pub const ALL: [DocumentType; 5] = [
        DocumentType::Epic,
        DocumentType::Story,
        DocumentType::Adoc,
        DocumentType::Docs,
        DocumentType::UseCase,
    ];

    /// Stem used in template file names (`<slug>_template.<ext>`).
    pub fn slug(self) -> &'static str {
        match self {
            DocumentType::Epic => "epic",
            DocumentType::Story => "story",
            DocumentType::Adoc => "adoc",
            DocumentType::Docs => "docs",
            DocumentType::UseCase => "use_case",
        }
    }

    /// Markup the template for this type is written in.
    pub fn default_markup(self) -> Markup {
        match self {
            DocumentType::Epic | DocumentType::Story => Markup::Jira,
            DocumentType::Docs => Markup::Markdown,
            DocumentType::Adoc | DocumentType::UseCase => Markup::AsciiDoc,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DocumentType::Epic => "Epic",
            DocumentType::Story => "Story",
            DocumentType::Adoc => "AsciiDoc document",
            DocumentType::Docs => "Documentation",
            DocumentType::UseCase => "Use case",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for DocumentType {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epic" => Ok(DocumentType::Epic),
            "story" => Ok(DocumentType::Story),
            "adoc" => Ok(DocumentType::Adoc),
            "docs" => Ok(DocumentType::Docs),
            "use-case" | "use_case" | "usecase" => Ok(DocumentType::UseCase),
            other => Err(GenerationError::TemplateNotFound {
                doc_type: other.to_string(),
                dir: PathBuf::new(),
            }),
        }
    }
}

/// Surrounding markup of a template; decides how lists and tables are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Markup {
    Jira,
    Markdown,
    #[value(name = "asciidoc")]
    AsciiDoc,
}

impl Markup {
    /// Markup implied by a template file's extension, if any.
    pub fn from_extension(path: &Path) -> Option<Markup> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("adoc") | Some("asciidoc") => Some(Markup::AsciiDoc),
            _ => None,
        }
    }
}

/// A loaded template. Immutable once built.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    pub doc_type: DocumentType,
    pub path: PathBuf,
    /// Markup the template text is written in
    pub markup: Markup,
    pub raw_text: String,
    /// Distinct placeholder names in first-occurrence order
    pub placeholders: Vec<String>,
}

impl TemplateDocument {
    pub fn from_text(doc_type: DocumentType, path: PathBuf, raw_text: String) -> Self {
        let markup = Markup::from_extension(&path).unwrap_or_else(|| doc_type.default_markup());
        let placeholders = extract_placeholders(&raw_text, markup);
        Self {
            doc_type,
            path,
            markup,
            raw_text,
            placeholders,
        }
    }
}

/// Directory of `<slug>_template.<ext>` files.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    dir: PathBuf,
}

impl TemplateCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the template file for `doc_type`, if one exists.
    pub fn template_path(&self, doc_type: DocumentType) -> Option<PathBuf> {
        TEMPLATE_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}_template.{}", doc_type.slug(), ext)))
            .find(|path| path.is_file())
    }

    pub fn load(&self, doc_type: DocumentType) -> Result<TemplateDocument, GenerationError> {
        let path = self
            .template_path(doc_type)
            .ok_or_else(|| GenerationError::TemplateNotFound {
                doc_type: doc_type.slug().to_string(),
                dir: self.dir.clone(),
            })?;
        let raw_text = std::fs::read_to_string(&path)?;
        let template = TemplateDocument::from_text(doc_type, path, raw_text);
        tracing::debug!(
            doc_type = %doc_type,
            path = %template.path.display(),
            placeholders = template.placeholders.len(),
            "Loaded template"
        );
        Ok(template)
    }

    /// Document types that have a template in this catalog.
    pub fn available(&self) -> Vec<DocumentType> {
        DocumentType::ALL
            .into_iter()
            .filter(|doc_type| self.template_path(*doc_type).is_some())
            .collect()
    }
}

/// A piece of template text: literal, or a placeholder to substitute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Placeholder(&'a str),
}

/// Extract distinct placeholder names in first-occurrence order.
pub fn extract_placeholders(raw: &str, markup: Markup) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for segment in scan(raw, markup) {
        if let Segment::Placeholder(name) = segment {
            if !names.iter().any(|existing| existing == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fence {
    Backticks,
    Tildes,
    Listing,
    Literal,
    JiraCode,
    JiraNoformat,
}

// `----` and `....` are horizontal rules outside AsciiDoc.
fn fence_of(line: &str, markup: Markup) -> Option<Fence> {
    let trimmed = line.trim();
    let asciidoc = markup == Markup::AsciiDoc;
    if trimmed.starts_with("```") {
        Some(Fence::Backticks)
    } else if trimmed.starts_with("~~~") {
        Some(Fence::Tildes)
    } else if asciidoc && trimmed.len() >= 4 && trimmed.chars().all(|c| c == '-') {
        Some(Fence::Listing)
    } else if asciidoc && trimmed.len() >= 4 && trimmed.chars().all(|c| c == '.') {
        Some(Fence::Literal)
    } else if trimmed.starts_with("{code") {
        Some(Fence::JiraCode)
    } else if trimmed.starts_with("{noformat") {
        Some(Fence::JiraNoformat)
    } else {
        None
    }
}

/// Whether `line` is a block delimiter in `markup`.
pub(crate) fn is_fence_line(line: &str, markup: Markup) -> bool {
    fence_of(line, markup).is_some()
}

/// End offset of a fenced span that opens and closes on the same line,
/// e.g. `{noformat}x{noformat}` or ```` ```x``` ````.
fn single_line_span_end(line: &str, fence: Fence) -> Option<usize> {
    let start = line.len() - line.trim_start().len();
    let body = &line[start..];
    let (opener_len, closer) = match fence {
        Fence::Backticks => (3, "```"),
        Fence::Tildes => (3, "~~~"),
        Fence::JiraCode => (body.find('}')? + 1, "{code}"),
        Fence::JiraNoformat => (body.find('}')? + 1, "{noformat}"),
        Fence::Listing | Fence::Literal => return None,
    };
    let close = body[opener_len..].find(closer)?;
    Some(start + opener_len + close + closer.len())
}

/// Split template text into literal and placeholder segments.
///
/// Concatenating every `Text` segment with the original `{{ ... }}` tokens in
/// place of each `Placeholder` reproduces the input exactly.
pub(crate) fn scan(raw: &str, markup: Markup) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut open_fence: Option<Fence> = None;

    for line in raw.split_inclusive('\n') {
        let fence = fence_of(line, markup);
        match (open_fence, fence) {
            (Some(open), Some(found)) if open == found => {
                open_fence = None;
                segments.push(Segment::Text(line));
                continue;
            }
            (Some(_), _) => {
                segments.push(Segment::Text(line));
                continue;
            }
            (None, Some(found)) => {
                if let Some(end) = single_line_span_end(line, found) {
                    segments.push(Segment::Text(&line[..end]));
                    scan_line(&line[end..], &mut segments);
                } else {
                    open_fence = Some(found);
                    segments.push(Segment::Text(line));
                }
                continue;
            }
            (None, None) => {}
        }
        scan_line(line, &mut segments);
    }
    segments
}

fn scan_line<'a>(line: &'a str, segments: &mut Vec<Segment<'a>>) {
    let mut rest = line;
    while !rest.is_empty() {
        let Some(tick) = rest.find('`') else {
            scan_placeholders(rest, segments);
            return;
        };
        let Some(close) = rest[tick + 1..].find('`') else {
            scan_placeholders(rest, segments);
            return;
        };
        let span_end = tick + 1 + close + 1;
        scan_placeholders(&rest[..tick], segments);
        segments.push(Segment::Text(&rest[tick..span_end]));
        rest = &rest[span_end..];
    }
}

fn scan_placeholders<'a>(text: &'a str, segments: &mut Vec<Segment<'a>>) {
    let mut last = 0;
    for captures in PLACEHOLDER_REGEX.captures_iter(text) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Text(&text[last..whole.start()]));
        }
        segments.push(Segment::Placeholder(name.as_str()));
        last = whole.end();
    }
    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }
}
