//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/btsearch/btsearch.toml`
//! 3. Local config: `./.btsearch.toml`, or the file given with `--config`
//! 4. Environment variables: `BTSEARCH_*` prefix, `__` between sections,
//!    e.g. `BTSEARCH_SEARCH__STRATEGY=memoized`

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ScanStrategy, ValueBound, DEFAULT_MAX_VALUE};

/// File name of the local config in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".btsearch.toml";

/// Random generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerateConfig {
    /// Probability that a generated slot stays empty
    pub none_probability: f64,
    /// File every generated tree is written to; empty string disables
    pub autosave: Option<PathBuf>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            none_probability: 0.2,
            autosave: Some(PathBuf::from("generated_tree.txt")),
        }
    }
}

/// Subtree search settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Strategy of the first-valid-subtree scan
    pub strategy: ScanStrategy,
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub max_value: Option<u32>,
    pub render_limit: Option<usize>,
    pub generate: RawGenerateConfig,
    pub search: RawSearchConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawGenerateConfig {
    pub none_probability: Option<f64>,
    pub autosave: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSearchConfig {
    pub strategy: Option<ScanStrategy>,
}

/// Unified configuration for btsearch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Largest allowed node value (values are 1..=max_value)
    pub max_value: u32,
    /// Trees with more nodes are not rendered
    pub render_limit: usize,
    pub generate: GenerateConfig,
    pub search: SearchConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_value: DEFAULT_MAX_VALUE,
            render_limit: 100,
            generate: GenerateConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Get the XDG config directory for btsearch.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "btsearch").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("btsearch.toml"))
}

/// Get the path to the local config file in the working directory.
pub fn local_config_path() -> PathBuf {
    PathBuf::from(LOCAL_CONFIG_FILE)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// `Ok(None)` for a missing key, an error for a value of the wrong type.
fn present<T>(result: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match result {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

impl Settings {
    /// Value bound derived from `max_value`.
    pub fn bound(&self) -> ApplicationResult<ValueBound> {
        Ok(ValueBound::new(self.max_value)?)
    }

    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            max_value: overlay.max_value.unwrap_or(self.max_value),
            render_limit: overlay.render_limit.unwrap_or(self.render_limit),
            generate: GenerateConfig {
                none_probability: overlay
                    .generate
                    .none_probability
                    .unwrap_or(self.generate.none_probability),
                autosave: overlay
                    .generate
                    .autosave
                    .clone()
                    .or_else(|| self.generate.autosave.clone()),
            },
            search: SearchConfig {
                strategy: overlay.search.strategy.unwrap_or(self.search.strategy),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Explicit local config; must exist when given.
    ///   Without it `./.btsearch.toml` is used if present.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::FileNotFound(path.to_path_buf()));
                }
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                let local_path = local_config_path();
                if local_path.exists() {
                    current = current.merge_with(&load_raw_settings(&local_path)?);
                }
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply BTSEARCH_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("BTSEARCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;
        Self::apply_overrides(settings, &config)
    }

    /// Absent keys keep the current value; present keys must parse.
    fn apply_overrides(mut settings: Self, config: &Config) -> Result<Self, ApplicationError> {
        if let Some(val) = present(config.get_int("max_value"))? {
            settings.max_value = u32::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("max_value out of range: {}", val),
            })?;
        }
        if let Some(val) = present(config.get_int("render_limit"))? {
            settings.render_limit =
                usize::try_from(val).map_err(|_| ApplicationError::Config {
                    message: format!("render_limit out of range: {}", val),
                })?;
        }
        if let Some(val) = present(config.get_float("generate.none_probability"))? {
            settings.generate.none_probability = val;
        }
        if let Some(val) = present(config.get_string("generate.autosave"))? {
            settings.generate.autosave = Some(PathBuf::from(val));
        }
        if let Some(val) = present(config.get_string("search.strategy"))? {
            settings.search.strategy = val.parse().map_err(|e| ApplicationError::Config {
                message: format!("search.strategy: {}", e),
            })?;
        }

        Ok(settings)
    }

    /// Expand `~` and `$VAR` in the autosave path; an empty path disables autosave.
    fn expand_paths(&mut self) {
        self.generate.autosave = self
            .generate
            .autosave
            .take()
            .map(|p| expand_path(&p.to_string_lossy()))
            .filter(|p| !p.as_os_str().is_empty());
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.max_value == 0 {
            return Err(ApplicationError::Config {
                message: "max_value must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.generate.none_probability) {
            return Err(ApplicationError::Config {
                message: format!(
                    "generate.none_probability must be between 0 and 1, got {}",
                    self.generate.none_probability
                ),
            });
        }
        Ok(())
    }

    /// Commented TOML template with the compiled defaults.
    pub fn template() -> Result<String, ApplicationError> {
        let body = toml::to_string_pretty(&Settings::default()).map_err(|e| {
            ApplicationError::Config {
                message: e.to_string(),
            }
        })?;
        Ok(format!(
            "# btsearch configuration\n# search.strategy: \"rescan\" or \"memoized\"\n\n{}",
            body
        ))
    }
}

/// Expand shell variables and tilde in a path string.
fn expand_path(path: &str) -> PathBuf {
    shellexpand::full(path)
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| PathBuf::from(path))
}
