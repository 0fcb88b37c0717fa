use crate::accumulator::DayBoundary;
use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct StateConfig {
    /// Optional override for state directory (for testing)
    pub state_dir_override: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimerConfig {
    /// Wall-clock length of one tick. One tick always counts as one second.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub day_boundary: DayBoundary,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            day_boundary: DayBoundary::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TimerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            anyhow::bail!("Tick interval must be greater than 0");
        }
        Ok(())
    }

    /// Settings that load fine but are probably not what the user wants.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.tick_interval_ms != 1000 {
            warnings.push(format!(
                "tick interval is {}ms, not one second; recorded time will not match wall-clock time",
                self.tick_interval_ms
            ));
        }
        warnings
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        tracing_subscriber::EnvFilter::try_new(&self.level)
            .with_context(|| format!("Invalid log level '{}'", self.level))?;
        Ok(())
    }
}

impl Config {
    /// Validate all configuration
    pub fn validate(&self) -> Result<()> {
        self.timer.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Non-fatal findings, for logging once a subscriber is installed.
    pub fn warnings(&self) -> Vec<String> {
        self.timer.warnings()
    }
}

pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let loader = ConfigBuilder::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
        .build()
        .context("Failed to build config loader")?;

    loader
        .try_deserialize()
        .context("Failed to parse config file")
}

/// Loads `~/.daytally/config.toml`, falling back to defaults when it does not exist.
pub fn load() -> Result<Config> {
    let config_path = crate::platform::config_path()?;
    if !config_path.exists() {
        return Ok(Config::default());
    }

    let config = load_from_path(&config_path)?;
    config.validate()?;
    Ok(config)
}

pub fn save_to_path<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;

    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml_string).context("Failed to write config file")?;

    Ok(())
}

/// Sets a dotted key such as `timer.tick_interval_ms`, keeping the value's type.
///
/// The new value is parsed as a TOML literal when possible and kept as a string
/// otherwise; the result must still deserialize into a valid [`Config`].
pub fn set_key(config: &Config, key: &str, raw: &str) -> Result<Config> {
    let mut root = toml::Value::try_from(config).context("Failed to serialize config")?;

    let (path, leaf) = match key.rsplit_once('.') {
        Some((path, leaf)) => (Some(path), leaf),
        None => (None, key),
    };

    let mut table = root.as_table_mut().context("Config root is not a table")?;
    if let Some(path) = path {
        for part in path.split('.') {
            table = table
                .get_mut(part)
                .and_then(toml::Value::as_table_mut)
                .with_context(|| format!("Key not found: {}", part))?;
        }
    }

    let value = parse_value(raw);
    table.insert(leaf.to_string(), value);

    let updated: Config = root
        .try_into()
        .with_context(|| format!("Invalid value for {}: {}", key, raw))?;
    updated.validate()?;
    Ok(updated)
}

fn parse_value(raw: &str) -> toml::Value {
    format!("v = {}", raw)
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
