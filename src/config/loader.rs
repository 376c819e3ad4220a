//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use toml::Value;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Key/value view over a loaded configuration file.
///
/// Keys use dotted paths into the TOML tree (`server.listen_addr`).
/// An environment variable named after the key, uppercased with dots
/// replaced by underscores (`SERVER_LISTEN_ADDR`), takes precedence
/// over the file.
#[derive(Debug, Clone)]
pub struct Settings {
    root: Value,
}

impl Settings {
    /// Look up a string value, env override first.
    ///
    /// Scalar file values (integers, floats, booleans) are rendered
    /// as strings, the way the original consumers expect.
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Ok(value) = std::env::var(env_key(key)) {
            return Some(value);
        }
        match lookup(&self.root, key)? {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Look up a string value that must be present.
    ///
    /// # Panics
    ///
    /// Panics if the key resolves to nothing. A missing required
    /// configuration value is a startup-fatal condition, not a
    /// recoverable error.
    pub fn require_string(&self, key: &str) -> String {
        match self.get_string(key) {
            Some(value) => value,
            None => panic!("required config key {key:?} is missing"),
        }
    }
}

fn env_key(key: &str) -> String {
    key.replace('.', "_").to_uppercase()
}

fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = root;
    for part in key.split('.') {
        current = current.as_table()?.get(part)?;
    }
    Some(current)
}

/// Load configuration from a TOML file.
///
/// A missing or unparsable file is an error; deciding whether that is
/// fatal is left to the call site (at startup it always is).
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let root: Value = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "Configuration loaded");
    Ok(Settings { root })
}
