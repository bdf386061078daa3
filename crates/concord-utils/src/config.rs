//! Settings management utilities

use anyhow::Context;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::path::Path;
use thiserror::Error;

use crate::logging::LogFormat;

/// Environment variable holding the default log level
pub const LOG_LEVEL_ENV: &str = "CONCORD_LOG_LEVEL";
/// Environment variable holding the log format
pub const LOG_FORMAT_ENV: &str = "CONCORD_LOG_FORMAT";

/// Settings errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// Process-level settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Application name
    pub app_name: String,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "concord".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// Read settings from `CONCORD_LOG_LEVEL` and `CONCORD_LOG_FORMAT`
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            let level = level.trim().to_ascii_lowercase();
            if !matches!(
                level.as_str(),
                "trace" | "debug" | "info" | "warn" | "error" | "off"
            ) {
                return Err(SettingsError::InvalidValue {
                    var: LOG_LEVEL_ENV,
                    reason: format!("unknown level {level}"),
                });
            }
            settings.log_level = level;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            settings.log_format = format
                .parse()
                .map_err(|reason| SettingsError::InvalidValue {
                    var: LOG_FORMAT_ENV,
                    reason,
                })?;
        }
        Ok(settings)
    }
}

/// Load and deserialize a JSON file
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_reads_level_and_format() {
        let settings =
            Settings::from_lookup(lookup(&[(LOG_LEVEL_ENV, "DEBUG"), (LOG_FORMAT_ENV, "json")]))
                .unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Settings::from_lookup(lookup(&[(LOG_LEVEL_ENV, "loud")])).is_err());
        assert!(Settings::from_lookup(lookup(&[(LOG_FORMAT_ENV, "xml")])).is_err());
    }

    #[test]
    fn test_load_json_roundtrip_and_errors() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("concord-settings-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"app_name":"x","log_level":"warn","log_format":"json"}"#)
            .unwrap();
        let settings: Settings = load_json(&path).unwrap();
        assert_eq!(settings.log_level, "warn");
        std::fs::remove_file(&path).unwrap();

        let err = load_json::<Settings>(dir.join("concord-missing-file.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
