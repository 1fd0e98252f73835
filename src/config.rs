use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, WidgetsError};
use crate::projector::ProjectionOptions;

/// Main configuration structure loaded from neuroml_widgets.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub projection: ProjectionConfig,
    pub simulation: SimulationConfig,
    pub chooser: ChooserConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Component tree projection defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub max_list_members: usize,
    /// Declared type names grouped into their own tabs
    pub tabbed_types: Vec<String>,
    /// Unset means no depth guard
    pub max_depth: Option<usize>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_list_members: 10,
            tabbed_types: Vec::new(),
            max_depth: None,
        }
    }
}

impl ProjectionConfig {
    /// Snapshot as projector options
    pub fn options(&self) -> ProjectionOptions {
        let mut options = ProjectionOptions::new(self.max_list_members)
            .with_tabbed_types(self.tabbed_types.iter().cloned());
        if let Some(depth) = self.max_depth {
            options = options.with_max_depth(depth);
        }
        options
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(WidgetsError::Config {
                message: "projection.max_depth must be at least 1 when set".into(),
            });
        }
        if self.tabbed_types.iter().any(|t| t.trim().is_empty()) {
            return Err(WidgetsError::Config {
                message: "projection.tabbed_types must not contain empty names".into(),
            });
        }
        Ok(())
    }
}

/// Parameter form and external runner settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Runner identifier handed to the runner on every submission
    pub runner: String,
    /// Program spawned by the command runner
    pub runner_command: String,
    pub parameters: Vec<String>,
    /// Where submitted descriptors are written; next to the source when unset
    pub output_dir: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runner: "jneuroml".to_string(),
            runner_command: "pynml".to_string(),
            parameters: vec!["step".into(), "length".into(), "seed".into()],
            output_dir: None,
        }
    }
}

/// File chooser patterns
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChooserConfig {
    pub nml_pattern: String,
    pub lems_pattern: String,
    pub show_hidden: bool,
}

impl Default for ChooserConfig {
    fn default() -> Self {
        Self {
            nml_pattern: "*.nml".to_string(),
            lems_pattern: "LEMS*xml".to_string(),
            show_hidden: false,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "neuroml_widgets=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn load_from_env() -> Self {
        let mut runtime = Self::default();
        if let Ok(level) = std::env::var("NMLW_LOG")
            && !level.trim().is_empty()
        {
            runtime.log_level = level;
        }
        runtime
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses NEUROML_WIDGETS_CONFIG environment variable or defaults to "neuroml_widgets.toml"
    pub fn load() -> anyhow::Result<Self> {
        Self::load_env_file();

        let config_path = std::env::var("NEUROML_WIDGETS_CONFIG")
            .unwrap_or_else(|_| "neuroml_widgets.toml".to_string());

        let mut config = Self::load_from_path(&config_path)?;
        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();

        config.projection.validate()?;
        if config.simulation.parameters.is_empty() {
            tracing::warn!("simulation.parameters is empty, the form will have no fields");
        }

        Ok(config)
    }

    /// Load NMLW_ENV_FILE if set, otherwise ./.env when present.
    /// Variables already in the environment are not overwritten.
    pub fn load_env_file() {
        if let Ok(env_path) = std::env::var("NMLW_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }
    }

    /// Read a TOML file, falling back to defaults when it does not exist
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(WidgetsError::io(path, e)),
        }
    }

    /// Apply NMLW_* environment overrides (env-first)
    pub fn apply_env_overrides(&mut self) {
        if let Some(max) = std::env::var("NMLW_MAX_LIST_MEMBERS")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            self.projection.max_list_members = max;
            tracing::debug!("NMLW_MAX_LIST_MEMBERS env override applied");
        }
        if let Ok(types) = std::env::var("NMLW_TABBED_TYPES") {
            self.projection.tabbed_types = types
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
            tracing::debug!("NMLW_TABBED_TYPES env override applied");
        }
        if let Some(depth) = std::env::var("NMLW_MAX_DEPTH")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            self.projection.max_depth = (depth > 0).then_some(depth);
        }
        if let Ok(runner) = std::env::var("NMLW_RUNNER") {
            self.simulation.runner = runner;
        }
        if let Ok(command) = std::env::var("NMLW_RUNNER_COMMAND") {
            self.simulation.runner_command = command;
        }
        if let Ok(dir) = std::env::var("NMLW_OUTPUT_DIR") {
            self.simulation.output_dir = Some(PathBuf::from(dir));
        }
    }
}
