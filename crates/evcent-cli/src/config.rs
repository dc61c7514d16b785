use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::output::OutputMode;

/// Optional TOML file passed with `--config`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSection {
    #[serde(default)]
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub final_only: Option<bool>,
    #[serde(default)]
    pub show_matrix: Option<bool>,
}

/// Values taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct FlagOverrides {
    pub max_iterations: Option<usize>,
    pub json: bool,
    pub final_only: bool,
    pub show_matrix: bool,
}

/// Values taken from `EVCENT_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub max_iterations: Option<String>,
    pub output: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            max_iterations: env::var("EVCENT_MAX_ITERATIONS").ok(),
            output: env::var("EVCENT_OUTPUT").ok(),
        }
    }
}

/// Effective settings after layering flags > env > file > defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub max_iterations: Option<usize>,
    pub output: OutputMode,
    pub final_only: bool,
    pub show_matrix: bool,
}

pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str::<FileConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_settings(config_path: Option<&Path>, flags: &FlagOverrides) -> Result<Settings> {
    let file = match config_path {
        Some(path) => load_file_config(path)?,
        None => FileConfig::default(),
    };
    resolve(flags, &EnvOverrides::from_env(), &file)
}

/// Layering logic, separated from I/O for testability.
fn resolve(flags: &FlagOverrides, env: &EnvOverrides, file: &FileConfig) -> Result<Settings> {
    let env_max = env
        .max_iterations
        .as_deref()
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .with_context(|| format!("EVCENT_MAX_ITERATIONS must be a positive integer, got '{raw}'"))
        })
        .transpose()?;

    let max_iterations = flags
        .max_iterations
        .or(env_max)
        .or(file.engine.max_iterations);
    if max_iterations == Some(0) {
        bail!("max_iterations must be at least 1");
    }

    let output = if flags.json {
        OutputMode::Json
    } else if let Some(name) = env.output.as_deref() {
        OutputMode::from_name(name)
    } else if let Some(name) = file.output.format.as_deref() {
        OutputMode::from_name(name)
    } else {
        OutputMode::Human
    };

    Ok(Settings {
        max_iterations,
        output,
        final_only: flags.final_only || file.output.final_only.unwrap_or(false),
        show_matrix: flags.show_matrix || file.output.show_matrix.unwrap_or(false),
    })
}
