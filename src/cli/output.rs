//! CLI output: error mapping, exit statuses and the document sink.

use crate::error::GenerationError;
use anyhow::{bail, Context};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
/// `check` found placeholders without a descriptor
pub const EXIT_CHECK_FAILED: i32 = 2;

/// Map a command failure to the line printed on stderr.
pub fn map_error(e: &anyhow::Error) -> String {
    let heading = match e.downcast_ref::<GenerationError>() {
        Some(GenerationError::Config(_)) => "Configuration error",
        Some(GenerationError::TemplateNotFound { .. }) => "Template error",
        Some(GenerationError::Transport(_)) => "LLM service error",
        Some(GenerationError::Cancelled) => "Cancelled",
        Some(GenerationError::Io(_)) | None => "Error",
    };
    format!("{}: {:#}", heading.red().bold(), e)
}

/// Write a finished document to `<output_dir>/<name>`.
///
/// The text goes to a temporary sibling first and is renamed into place, so an
/// interrupted write never leaves a partial document under the final name.
pub fn write_document(output_dir: &Path, name: &str, text: &str) -> anyhow::Result<PathBuf> {
    let file_name = Path::new(name);
    if name.trim().is_empty() || file_name.file_name() != Some(file_name.as_os_str()) {
        bail!(GenerationError::Config(format!(
            "Output name must be a plain file name (got '{}')",
            name
        )));
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let target = output_dir.join(file_name);
    let staging = output_dir.join(format!(".{}.partial", name));
    std::fs::write(&staging, text)
        .with_context(|| format!("writing {}", staging.display()))?;
    if let Err(e) = std::fs::rename(&staging, &target) {
        let _ = std::fs::remove_file(&staging);
        return Err(e).with_context(|| format!("moving document into {}", target.display()));
    }
    Ok(target)
}
