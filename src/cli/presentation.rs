//! CLI presentation: text/json formatters and terminal progress lines.

use crate::config::Settings;
use crate::error::FailureReason;
use crate::generation::{GenerationReport, GenerationResult, ProgressSink, ResultStatus};
use crate::prompts::PromptCatalog;
use crate::template::{DocumentType, TemplateDocument};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::PathBuf;

/// One row of the `check` command.
#[derive(Debug, Clone)]
pub struct TemplateCheck {
    pub doc_type: DocumentType,
    pub path: PathBuf,
    pub placeholders: usize,
    pub unresolved: Vec<String>,
}

fn heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_fields_text(template: &TemplateDocument, catalog: &PromptCatalog) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Placeholder", "Strategy", "Limits"]);
    for (index, name) in template.placeholders.iter().enumerate() {
        let (strategy, limits) = match catalog.descriptor(name) {
            Some(descriptor) => (
                descriptor.strategy.name().to_string(),
                descriptor.strategy.summary(),
            ),
            None => ("unknown".to_string(), "-".to_string()),
        };
        table.add_row(vec![(index + 1).to_string(), name.clone(), strategy, limits]);
    }
    format!(
        "{}\nTemplate: {} ({})\n\n{}",
        heading(template.doc_type.display_name()),
        template.path.display(),
        format!("{:?}", template.markup).to_lowercase(),
        table
    )
}

pub fn format_fields_json(template: &TemplateDocument, catalog: &PromptCatalog) -> String {
    let fields: Vec<_> = template
        .placeholders
        .iter()
        .map(|name| match catalog.descriptor(name) {
            Some(descriptor) => json!({
                "placeholder": name,
                "strategy": descriptor.strategy,
                "additional_info": descriptor.extra_instructions,
            }),
            None => json!({ "placeholder": name, "strategy": null }),
        })
        .collect();
    let out = json!({
        "type": template.doc_type,
        "template": template.path,
        "fields": fields,
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_check_result(checks: &[TemplateCheck], descriptor_count: usize) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Type", "Template", "Placeholders", "Status"]);
    for check in checks {
        let status = if check.unresolved.is_empty() {
            format!("{}", "ok".green())
        } else {
            format!(
                "{} {}",
                "missing:".red(),
                check.unresolved.join(", ")
            )
        };
        table.add_row(vec![
            check.doc_type.to_string(),
            check.path.display().to_string(),
            check.placeholders.to_string(),
            status,
        ]);
    }

    let unresolved: usize = checks.iter().map(|c| c.unresolved.len()).sum();
    let verdict = if checks.is_empty() {
        format!("{}", "No templates found.".yellow())
    } else if unresolved == 0 {
        format!("{}", "All placeholders resolve.".green())
    } else {
        format!(
            "{}",
            format!("{} placeholder(s) without a descriptor.", unresolved).red()
        )
    };
    format!(
        "{}\nPrompt catalog: {} descriptor(s)\n\n{}\n\n{}",
        heading("Template check"),
        descriptor_count,
        table,
        verdict
    )
}

pub fn format_models(models: &[String], settings: &Settings) -> String {
    if models.is_empty() {
        return format!(
            "No models reported by {} at {}.",
            settings.provider.kind.slug(),
            settings.provider.base_url
        );
    }
    let mut output = format!(
        "{}\n",
        heading(&format!(
            "Models on {} ({})",
            settings.provider.base_url,
            settings.provider.kind.slug()
        ))
    );
    for model in models {
        let marker = if *model == settings.provider.model {
            format!("{}", "*".green())
        } else {
            " ".to_string()
        };
        output.push_str(&format!("{} {}\n", marker, model));
    }
    output.push_str(&format!("\nTotal: {} model(s)", models.len()));
    output
}

fn reason_text(reason: &FailureReason) -> String {
    match reason {
        FailureReason::UnknownPlaceholder => "no prompt descriptor".to_string(),
        FailureReason::EmptyResponse => "model returned nothing".to_string(),
        FailureReason::Normalization(e) => e.to_string(),
    }
}

/// Summary printed on stderr after a run.
pub fn format_generation_summary(report: &GenerationReport) -> String {
    let failed = report.failed();
    let line = format!(
        "{} generated in {:.2} seconds ({} field(s), started {})",
        report.document.doc_type.display_name(),
        report.elapsed.as_secs_f64(),
        report.results.len(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let mut output = if failed.is_empty() {
        line.green().to_string()
    } else {
        line.yellow().to_string()
    };
    if !failed.is_empty() {
        output.push_str(&format!(
            "\n{}",
            format!("{} field(s) left as [[MISSING: …]] markers:", failed.len()).yellow()
        ));
        for (placeholder, reason) in failed {
            output.push_str(&format!("\n  - {}: {}", placeholder, reason_text(reason)));
        }
    }
    output
}

/// Prints one status line per field on stderr.
pub struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn field_started(&self, placeholder: &str, position: usize, total: usize) {
        eprintln!(
            "{}",
            format!("[{}/{}] Generating {}…", position, total, placeholder).dimmed()
        );
    }

    fn field_finished(&self, result: &GenerationResult) {
        if let ResultStatus::Failed(reason) = &result.status {
            eprintln!(
                "{} {}: {}",
                "✗".red(),
                result.placeholder,
                reason_text(reason)
            );
        }
    }
}
