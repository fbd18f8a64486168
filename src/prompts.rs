//! Prompt catalog: the shared system prompt plus one generation descriptor per placeholder.
//!
//! Loaded from a JSON file of the form
//! `{ "system_prompt": "...", "template_prompts": { "<placeholder>": { "type": "...", "args": {...}, "additional_info": "..." } } }`.
//! Strategy-critical arguments (`options`, `table_headers`) have no defaults; limits fall back
//! to fixed documented values when omitted.

use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_HEADER_WORDS: usize = 7;
pub const DEFAULT_SENTENCE_WORDS: usize = 50;
pub const DEFAULT_BULLET_LIMIT: usize = 5;
pub const DEFAULT_STEP_LIMIT: usize = 5;
pub const DEFAULT_TABLE_LIMIT: usize = 1;
pub const DEFAULT_MAX_SELECTIONS: usize = 1;

/// Parameters for free-text strategies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextParams {
    pub word_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulletParams {
    #[serde(rename = "bullet_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepParams {
    #[serde(rename = "step_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionParams {
    pub options: Vec<String>,
    pub max_selections: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableParams {
    pub table_limit: usize,
    #[serde(rename = "table_headers")]
    pub headers: Vec<String>,
    /// e.g. `BF<n>: <title>`
    #[serde(rename = "table_title", skip_serializing_if = "Option::is_none")]
    pub title_pattern: Option<String>,
}

/// How a placeholder's content is requested and validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "args", rename_all = "lowercase")]
pub enum Strategy {
    Header(TextParams),
    Sentence(TextParams),
    Bullets(BulletParams),
    Numbered(StepParams),
    Selection(SelectionParams),
    Table(TableParams),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Header(_) => "header",
            Strategy::Sentence(_) => "sentence",
            Strategy::Bullets(_) => "bullets",
            Strategy::Numbered(_) => "numbered",
            Strategy::Selection(_) => "selection",
            Strategy::Table(_) => "table",
        }
    }

    /// Short human summary of the strategy parameters.
    pub fn summary(&self) -> String {
        match self {
            Strategy::Header(p) | Strategy::Sentence(p) => format!("≤ {} words", p.word_limit),
            Strategy::Bullets(p) => format!("≤ {} items", p.limit),
            Strategy::Numbered(p) => format!("≤ {} steps", p.limit),
            Strategy::Selection(p) => format!(
                "{} of {} option(s)",
                p.max_selections,
                p.options.len()
            ),
            Strategy::Table(p) => format!(
                "≤ {} table(s), {} column(s)",
                p.table_limit,
                p.headers.len()
            ),
        }
    }
}

/// Binds one placeholder to its strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationDescriptor {
    pub placeholder_name: String,
    pub strategy: Strategy,
    pub extra_instructions: Option<String>,
}

/// Immutable snapshot of the prompt configuration for one run.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    system_prompt: String,
    descriptors: BTreeMap<String, GenerationDescriptor>,
}

#[derive(Deserialize)]
struct RawCatalog {
    system_prompt: Option<String>,
    #[serde(default)]
    template_prompts: BTreeMap<String, RawDescriptor>,
}

#[derive(Deserialize)]
struct RawDescriptor {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    args: RawArgs,
    #[serde(default, alias = "extra_instructions")]
    additional_info: Option<String>,
}

#[derive(Default, Deserialize)]
struct RawArgs {
    word_limit: Option<usize>,
    bullet_limit: Option<usize>,
    step_limit: Option<usize>,
    options: Option<Vec<String>>,
    max_selections: Option<usize>,
    table_limit: Option<usize>,
    table_headers: Option<Vec<String>>,
    #[serde(alias = "table_title_pattern")]
    table_title: Option<String>,
}

impl PromptCatalog {
    pub fn new(
        system_prompt: impl Into<String>,
        descriptors: impl IntoIterator<Item = GenerationDescriptor>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            descriptors: descriptors
                .into_iter()
                .map(|d| (d.placeholder_name.clone(), d))
                .collect(),
        }
    }

    /// Load and validate the catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, GenerationError> {
        if !path.is_file() {
            return Err(GenerationError::Config(format!(
                "Prompts configuration file '{}' not found",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let catalog = Self::from_json_str(&text).map_err(|e| match e {
            GenerationError::Config(msg) => {
                GenerationError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        tracing::debug!(
            path = %path.display(),
            descriptors = catalog.descriptors.len(),
            "Loaded prompt catalog"
        );
        Ok(catalog)
    }

    pub fn from_json_str(text: &str) -> Result<Self, GenerationError> {
        let raw: RawCatalog = serde_json::from_str(text)
            .map_err(|e| GenerationError::Config(format!("Invalid prompts JSON: {}", e)))?;

        let system_prompt = raw
            .system_prompt
            .filter(|prompt| !prompt.trim().is_empty())
            .ok_or_else(|| GenerationError::Config("'system_prompt' is missing or empty".into()))?;

        let mut descriptors = BTreeMap::new();
        for (name, raw_descriptor) in raw.template_prompts {
            let descriptor = build_descriptor(&name, raw_descriptor)
                .map_err(|msg| GenerationError::Config(format!("Placeholder '{}': {}", name, msg)))?;
            descriptors.insert(name, descriptor);
        }

        Ok(Self {
            system_prompt,
            descriptors,
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn descriptor(&self, placeholder: &str) -> Option<&GenerationDescriptor> {
        self.descriptors.get(placeholder)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.keys().map(String::as_str)
    }
}

fn limit(value: Option<usize>, default: usize, field: &str) -> Result<usize, String> {
    match value {
        Some(0) => Err(format!("'{}' must be at least 1", field)),
        Some(n) => Ok(n),
        None => Ok(default),
    }
}

fn non_empty_list(value: Option<Vec<String>>, field: &str, kind: &str) -> Result<Vec<String>, String> {
    let items: Vec<String> = value
        .unwrap_or_default()
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    if items.is_empty() {
        return Err(format!("'{}' strategy requires a non-empty '{}' list", kind, field));
    }
    Ok(items)
}

fn build_descriptor(name: &str, raw: RawDescriptor) -> Result<GenerationDescriptor, String> {
    let kind = raw.kind.ok_or_else(|| "missing 'type'".to_string())?;
    let args = raw.args;

    let strategy = match kind.trim().to_ascii_lowercase().as_str() {
        "header" => Strategy::Header(TextParams {
            word_limit: limit(args.word_limit, DEFAULT_HEADER_WORDS, "word_limit")?,
        }),
        "sentence" => Strategy::Sentence(TextParams {
            word_limit: limit(args.word_limit, DEFAULT_SENTENCE_WORDS, "word_limit")?,
        }),
        "bullets" => Strategy::Bullets(BulletParams {
            limit: limit(args.bullet_limit, DEFAULT_BULLET_LIMIT, "bullet_limit")?,
        }),
        "numbered" => Strategy::Numbered(StepParams {
            limit: limit(args.step_limit, DEFAULT_STEP_LIMIT, "step_limit")?,
        }),
        "selection" => Strategy::Selection(SelectionParams {
            options: non_empty_list(args.options, "options", "selection")?,
            max_selections: limit(args.max_selections, DEFAULT_MAX_SELECTIONS, "max_selections")?,
        }),
        "table" | "tables" => Strategy::Table(TableParams {
            table_limit: limit(args.table_limit, DEFAULT_TABLE_LIMIT, "table_limit")?,
            headers: non_empty_list(args.table_headers, "table_headers", "table")?,
            title_pattern: args.table_title.filter(|title| !title.trim().is_empty()),
        }),
        other => return Err(format!("unsupported generation type '{}'", other)),
    };

    Ok(GenerationDescriptor {
        placeholder_name: name.to_string(),
        strategy,
        extra_instructions: raw.additional_info.filter(|info| !info.trim().is_empty()),
    })
}
