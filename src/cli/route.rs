//! CLI route: single route table and run context. Dispatches to the pipeline and presentation.

use crate::cli::output::{write_document, EXIT_CHECK_FAILED, EXIT_SUCCESS};
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_check_result, format_fields_json, format_fields_text, format_generation_summary,
    format_models, TemplateCheck, TerminalProgress,
};
use crate::config::{ConfigLoader, Settings};
use crate::error::GenerationError;
use crate::generation::{unresolved_placeholders, CancelFlag, GenerationOptions, Generator};
use crate::prompts::PromptCatalog;
use crate::provider::ChatCompletionClient;
use crate::template::{DocumentType, Markup, TemplateCatalog};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a command produced: text for stdout, notes for stderr, and the exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn success(stdout: String) -> Self {
        Self {
            stdout,
            stderr: String::new(),
            exit_code: EXIT_SUCCESS,
        }
    }
}

/// Runtime context for CLI execution: effective settings and the workspace they resolve against.
pub struct RunContext {
    settings: Settings,
    workspace_root: PathBuf,
    show_progress: bool,
}

impl RunContext {
    /// Load settings for the workspace, or from an explicit settings file.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, GenerationError> {
        let settings = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self::with_settings(settings, workspace_root))
    }

    pub fn with_settings(settings: Settings, workspace_root: PathBuf) -> Self {
        Self {
            settings,
            workspace_root,
            show_progress: true,
        }
    }

    /// Turn per-field progress lines on stderr on or off.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> anyhow::Result<CommandOutput> {
        info!(command = command.name(), "Command started");
        let result = self.execute_inner(command);
        match &result {
            Ok(output) => info!(command = command.name(), exit_code = output.exit_code, "Command finished"),
            Err(e) => warn!(command = command.name(), error = %e, "Command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> anyhow::Result<CommandOutput> {
        match command {
            Commands::Generate {
                context,
                context_file,
                doc_type,
                output,
                model,
                markup,
                prompts,
                templates_dir,
            } => {
                let context = read_context(context.as_deref(), context_file.as_deref())?;
                let templates = TemplateCatalog::new(
                    templates_dir
                        .clone()
                        .unwrap_or_else(|| self.resolve(&self.settings.paths.templates_dir)),
                );
                let prompts_path = prompts
                    .clone()
                    .unwrap_or_else(|| self.resolve(&self.settings.paths.prompts_file));
                self.handle_generate(
                    &context,
                    *doc_type,
                    &templates,
                    &prompts_path,
                    model.as_deref(),
                    *markup,
                    output.as_deref(),
                )
            }
            Commands::Fields { doc_type, format } => {
                let templates = TemplateCatalog::new(self.resolve(&self.settings.paths.templates_dir));
                let template = templates.load(*doc_type)?;
                let prompts = PromptCatalog::load(&self.resolve(&self.settings.paths.prompts_file))?;
                let stdout = match format.as_str() {
                    "json" => format_fields_json(&template, &prompts),
                    "text" => format_fields_text(&template, &prompts),
                    other => {
                        return Err(GenerationError::Config(format!(
                            "Unknown output format '{}' (expected text or json)",
                            other
                        ))
                        .into())
                    }
                };
                Ok(CommandOutput::success(stdout))
            }
            Commands::Check => self.handle_check(),
            Commands::Models => self.handle_models(),
            Commands::Settings => Ok(CommandOutput::success(self.settings.to_toml()?)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_generate(
        &self,
        context: &str,
        doc_type: DocumentType,
        templates: &TemplateCatalog,
        prompts_path: &Path,
        model: Option<&str>,
        markup: Option<Markup>,
        output: Option<&str>,
    ) -> anyhow::Result<CommandOutput> {
        let template = templates.load(doc_type)?;
        let prompts = PromptCatalog::load(prompts_path)?;

        let mut provider = self.settings.provider.clone();
        if let Some(model) = model {
            provider.model = model.to_string();
        }
        provider.validate().map_err(GenerationError::Config)?;
        let options = GenerationOptions {
            model: provider.model.clone(),
            markup: markup.or(self.settings.generation.markup),
            empty_response_retries: self.settings.generation.empty_response_retries,
        };
        let client = ChatCompletionClient::new(provider)?;

        info!(
            doc_type = %doc_type,
            template = %template.path.display(),
            placeholders = template.placeholders.len(),
            "Template loaded"
        );

        let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
        let cancel = CancelFlag::new();
        let report = runtime.block_on(async {
            let listener = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Interrupted; stopping after the current field.");
                    listener.cancel();
                }
            });

            let mut generator = Generator::new(&prompts, &client, options);
            if self.show_progress {
                generator = generator.with_progress(&TerminalProgress);
            }
            generator.generate(context, &template, &cancel).await
        })?;

        let summary = format_generation_summary(&report);
        match output {
            Some(name) => {
                let output_dir = self.resolve(&self.settings.paths.output_dir);
                let path = write_document(&output_dir, name, &report.document.text)?;
                info!(path = %path.display(), "Document written");
                Ok(CommandOutput {
                    stdout: format!(
                        "{} written to {}",
                        report.document.doc_type.display_name(),
                        path.display()
                    ),
                    stderr: summary,
                    exit_code: EXIT_SUCCESS,
                })
            }
            None => Ok(CommandOutput {
                stdout: report.document.text,
                stderr: summary,
                exit_code: EXIT_SUCCESS,
            }),
        }
    }

    fn handle_check(&self) -> anyhow::Result<CommandOutput> {
        let prompts = PromptCatalog::load(&self.resolve(&self.settings.paths.prompts_file))?;
        let templates = TemplateCatalog::new(self.resolve(&self.settings.paths.templates_dir));

        let mut checks = Vec::new();
        for doc_type in templates.available() {
            let template = templates.load(doc_type)?;
            let unresolved = unresolved_placeholders(&template, &prompts)
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>();
            if !unresolved.is_empty() {
                warn!(doc_type = %doc_type, unresolved = ?unresolved, "Placeholders without descriptor");
            }
            checks.push(TemplateCheck {
                doc_type,
                path: template.path.clone(),
                placeholders: template.placeholders.len(),
                unresolved,
            });
        }

        let passed = !checks.is_empty() && checks.iter().all(|c| c.unresolved.is_empty());
        Ok(CommandOutput {
            stdout: format_check_result(&checks, prompts.len()),
            stderr: String::new(),
            exit_code: if passed { EXIT_SUCCESS } else { EXIT_CHECK_FAILED },
        })
    }

    fn handle_models(&self) -> anyhow::Result<CommandOutput> {
        let client = ChatCompletionClient::new(self.settings.provider.clone())?;
        let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
        let models = runtime
            .block_on(client.list_models())
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        Ok(CommandOutput::success(format_models(&models, &self.settings)))
    }

    /// Settings paths are relative to the workspace root.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }
}

fn read_context(inline: Option<&str>, file: Option<&Path>) -> anyhow::Result<String> {
    let context = match (inline, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading context file {}", path.display()))?,
        (None, None) => String::new(),
    };
    let context = context.trim().to_string();
    if context.is_empty() {
        warn!("Context is empty; fields will be generated from the prompts alone");
    }
    Ok(context)
}
