//! CLI parse: clap types for issuegen. No behavior; definitions only.

use crate::template::{DocumentType, Markup};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// Issuegen CLI - generate epics, stories and use cases from templates with a local LLM
#[derive(Parser)]
#[command(name = "issuegen", version)]
#[command(about = "Generate structured issue documents from templates using a local LLM")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where issuegen.toml is looked up)
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Settings file path (replaces the global and workspace settings files)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging and progress output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a document from a free-text context
    #[command(group(
        ArgGroup::new("context_source")
            .required(true)
            .args(["context", "context_file"]),
    ))]
    Generate {
        /// Context describing what the document is about
        context: Option<String>,

        /// Read the context from a file instead
        #[arg(long)]
        context_file: Option<PathBuf>,

        /// Document type
        #[arg(long = "type", value_enum, default_value_t = DocumentType::Story)]
        doc_type: DocumentType,

        /// Output file name, written under the output directory (stdout if not given)
        #[arg(long)]
        output: Option<String>,

        /// Model to request (overrides settings)
        #[arg(long)]
        model: Option<String>,

        /// Markup for generated lists and tables (overrides the template default)
        #[arg(long, value_enum)]
        markup: Option<Markup>,

        /// Prompt catalog file (overrides settings)
        #[arg(long)]
        prompts: Option<PathBuf>,

        /// Template directory (overrides settings)
        #[arg(long)]
        templates_dir: Option<PathBuf>,
    },
    /// List a template's placeholders and their strategies
    Fields {
        /// Document type
        #[arg(long = "type", value_enum, default_value_t = DocumentType::Story)]
        doc_type: DocumentType,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check that every template placeholder has a prompt descriptor
    Check,
    /// List models available on the configured provider
    Models,
    /// Show effective settings as TOML
    Settings,
}

impl Commands {
    /// Command name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Generate { .. } => "generate",
            Commands::Fields { .. } => "fields",
            Commands::Check => "check",
            Commands::Models => "models",
            Commands::Settings => "settings",
        }
    }
}
