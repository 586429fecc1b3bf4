//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `--config <path>` or `$XDG_CONFIG_HOME/nasutil/nasutil.toml`
//! 3. Environment variables: `NASUTIL_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{Device, MeterFormat, TraversalOrder};

/// Defaults for `traverse`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TraversalSettings {
    pub order: TraversalOrder,
    pub deduplicate: bool,
}

impl Default for TraversalSettings {
    fn default() -> Self {
        Self {
            order: TraversalOrder::Pre,
            deduplicate: true,
        }
    }
}

/// Rendering of meter values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MeterSettings {
    /// Format spec such as `:4f` or `:.3f`
    pub format: String,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            format: MeterFormat::GROUP.to_string(),
        }
    }
}

/// Unified configuration for nasutil.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub traversal: TraversalSettings,
    pub meter: MeterSettings,
    /// Target device for payload dispatch
    pub device: Device,
}

/// Raw settings for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub traversal: RawTraversalSettings,
    pub meter: RawMeterSettings,
    pub device: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTraversalSettings {
    pub order: Option<String>,
    pub deduplicate: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawMeterSettings {
    pub format: Option<String>,
}

/// Get the XDG config directory for nasutil.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "nasutil").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("nasutil.toml"))
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

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// An explicit `config_file` must exist; the global file is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_with_env(config_file, Self::env_source())
    }

    /// Same as [`load`](Self::load) with a caller-supplied environment source.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Config file
        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                current = current.merge_with(&load_raw_settings(path)?)?;
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        current = current.merge_with(&load_raw_settings(&global_path)?)?;
                    }
                }
            }
        }

        // 3. Environment variables
        current = Self::apply_env_overrides(current, env)?;

        current.validate()?;
        Ok(current)
    }

    fn env_source() -> Environment {
        Environment::with_prefix("NASUTIL")
            .prefix_separator("_")
            .separator("__")
    }

    /// Merge overlay config onto self: overlay wins if specified.
    fn merge_with(&self, overlay: &RawSettings) -> Result<Self, ApplicationError> {
        let mut merged = self.clone();
        if let Some(order) = &overlay.traversal.order {
            merged.traversal.order = parse_setting("traversal.order", order)?;
        }
        if let Some(dedup) = overlay.traversal.deduplicate {
            merged.traversal.deduplicate = dedup;
        }
        if let Some(format) = &overlay.meter.format {
            merged.meter.format = format.clone();
        }
        if let Some(device) = &overlay.device {
            merged.device = parse_setting("device", device)?;
        }
        Ok(merged)
    }

    /// Apply NASUTIL_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder().add_source(env).build().map_err(config_err)?;

        if let Some(val) = env_value::<String>(&config, "traversal.order")? {
            settings.traversal.order = parse_setting("traversal.order", &val)?;
        }
        if let Some(val) = env_value::<bool>(&config, "traversal.deduplicate")? {
            settings.traversal.deduplicate = val;
        }
        if let Some(val) = env_value::<String>(&config, "meter.format")? {
            settings.meter.format = val;
        }
        if let Some(val) = env_value::<String>(&config, "device")? {
            settings.device = parse_setting("device", &val)?;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        self.meter_format().map(|_| ())
    }

    /// Parsed meter format.
    pub fn meter_format(&self) -> Result<MeterFormat, ApplicationError> {
        parse_setting("meter.format", &self.meter.format)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# nasutil configuration
#
# Locations (by precedence, lowest to highest):
#   File: ~/.config/nasutil/nasutil.toml (or --config <path>)
#   Env:  NASUTIL_* environment variables, e.g. NASUTIL_TRAVERSAL__ORDER=post

# Target device for payload dispatch: "cpu", "cuda" or "cuda:<n>"
# device = "cpu"

[traversal]
# "pre" yields a scope before its contents, "post" after
# order = "pre"

# Skip mutables whose key was already yielded
# deduplicate = true

[meter]
# Fixed-point format: [:][width][.precision]f
# format = ":4f"
"#
        .to_string()
    }
}

fn parse_setting<T>(name: &str, value: &str) -> Result<T, ApplicationError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| ApplicationError::Config {
        message: format!("{name}: {e}"),
    })
}

/// A key from the environment layer: `None` when unset, an error when malformed.
fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("{key}: {e}"),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
