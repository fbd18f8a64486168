//! Settings
//!
//! Layered runtime settings. Later layers win:
//! built-in defaults, the global file, `./issuegen.toml`, then `ISSUEGEN__SECTION__KEY`
//! environment variables. An explicit settings file replaces both file layers.
//! CLI flags are folded in by the binary after loading.

use crate::error::GenerationError;
use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use crate::template::Markup;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge {
    pub(super) mod merge_policy;
}
mod sources {
    pub(super) mod global_file;
    pub(super) mod workspace_file;
}

use merge::merge_policy;
use sources::{global_file, workspace_file};

pub use sources::workspace_file::WORKSPACE_FILE_NAME;

const ENV_PREFIX: &str = "ISSUEGEN";
const ENV_SEPARATOR: &str = "__";

/// Root settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub generation: GenerationSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where templates, the prompt catalog and written documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    #[serde(default = "default_prompts_file")]
    pub prompts_file: PathBuf,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_prompts_file() -> PathBuf {
    PathBuf::from("templates/prompts.json")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            prompts_file: default_prompts_file(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Markup override; each document type has its own default
    #[serde(default)]
    pub markup: Option<Markup>,

    /// Extra attempts after an empty completion
    #[serde(default = "default_empty_response_retries")]
    pub empty_response_retries: u32,
}

fn default_empty_response_retries() -> u32 {
    1
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            markup: None,
            empty_response_retries: default_empty_response_retries(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), GenerationError> {
        self.provider
            .validate()
            .map_err(|e| GenerationError::Config(format!("[provider] {}", e)))?;
        for (key, path) in [
            ("templates_dir", &self.paths.templates_dir),
            ("prompts_file", &self.paths.prompts_file),
            ("output_dir", &self.paths.output_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(GenerationError::Config(format!(
                    "[paths] {} cannot be empty",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Effective settings as TOML, API key masked.
    pub fn to_toml(&self) -> Result<String, GenerationError> {
        let mut shown = self.clone();
        if shown.provider.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
            shown.provider.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).map_err(|e| GenerationError::Config(e.to_string()))
    }
}

/// Builds `Settings` from the configured layers.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings for a workspace, using the platform's global settings file.
    pub fn load(workspace_root: &Path) -> Result<Settings, GenerationError> {
        Self::load_with_global(Self::xdg_config_path().as_deref(), workspace_root)
    }

    /// Load settings with an explicit global file location (`None` skips that layer).
    pub fn load_with_global(
        global: Option<&Path>,
        workspace_root: &Path,
    ) -> Result<Settings, GenerationError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        Self::finish(builder)
    }

    /// Load settings from one explicit file. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<Settings, GenerationError> {
        if !path.is_file() {
            return Err(GenerationError::Config(format!(
                "Settings file not found: {}",
                path.display()
            )));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true));
        Self::finish(builder)
    }

    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Settings, GenerationError> {
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}
