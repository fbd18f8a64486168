//! Merge rules: built-in defaults sit under every other layer.

use crate::provider::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with the built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("provider.kind", "ollama")?
        .set_default("provider.base_url", DEFAULT_OLLAMA_URL)?
        .set_default("provider.model", DEFAULT_MODEL)?
        .set_default("provider.timeout_secs", 120)?
        .set_default("provider.max_tokens", 500)?
        .set_default("paths.templates_dir", "templates")?
        .set_default("paths.prompts_file", "templates/prompts.json")?
        .set_default("paths.output_dir", "output")?
        .set_default("generation.empty_response_retries", 1)
}
