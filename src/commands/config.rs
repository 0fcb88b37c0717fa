use crate::config::{Config, save_to_path, set_key};
use crate::platform::config_path;
use anyhow::{Context, Result};

pub fn list(config: &Config) -> Result<()> {
    let toml_str = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

pub fn get(key: &str, config: &Config) -> Result<()> {
    let value = serde_json::to_value(config).context("Failed to serialize config")?;

    // Dot notation: "timer.tick_interval_ms"
    let mut current = &value;
    for part in key.split('.') {
        current = current
            .get(part)
            .context(format!("Key not found: {}", part))?;
    }

    match current {
        serde_json::Value::String(s) => println!("{}", s),
        v => println!("{}", v),
    }

    Ok(())
}

/// Updates one key and rewrites `~/.daytally/config.toml`. Comments are not preserved.
pub fn set(key: &str, value: &str, config: &Config) -> Result<()> {
    let updated = set_key(config, key, value)?;
    let path = config_path()?;
    save_to_path(&updated, &path)?;
    println!("✓ {} = {}", key, value);
    Ok(())
}
