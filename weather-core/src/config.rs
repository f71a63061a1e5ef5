use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::provider::openweather::DEFAULT_BASE_URL;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

pub const API_KEY_ENV: &str = "WEATHER_API_KEY";
pub const PORT_ENV: &str = "PORT";
pub const UPSTREAM_URL_ENV: &str = "WEATHER_UPSTREAM_URL";

/// Relay configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// port = 4000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub upstream_url: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-relay", "weather-relay")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `WEATHER_API_KEY`, `PORT` and `WEATHER_UPSTREAM_URL` on top of
    /// the file values.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|name| env::var(name).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = var(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(port) = var(PORT_ENV) {
            let port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("{PORT_ENV} must be a port number, got '{port}'"))?;
            self.port = Some(port);
        }
        if let Some(url) = var(UPSTREAM_URL_ENV) {
            self.upstream_url = Some(url);
        }
        Ok(self)
    }

    /// Returns the upstream API key, if present.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS)
    }

    pub fn upstream_url(&self) -> &str {
        self.upstream_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_configured() {
        let cfg = Config::default();
        assert_eq!(cfg.api_key(), None);
        assert_eq!(cfg.port(), 4000);
        assert_eq!(cfg.bind_address(), "0.0.0.0");
        assert_eq!(cfg.upstream_url(), "https://api.openweathermap.org");
    }

    #[test]
    fn env_overrides_file_values() {
        let cfg = Config {
            api_key: Some("FILE_KEY".into()),
            port: Some(8080),
            ..Config::default()
        };

        let cfg = cfg
            .with_overrides_from(lookup(&[("WEATHER_API_KEY", "ENV_KEY"), ("PORT", "5000")]))
            .expect("valid overrides");

        assert_eq!(cfg.api_key(), Some("ENV_KEY"));
        assert_eq!(cfg.port(), 5000);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let cfg = Config {
            api_key: Some("FILE_KEY".into()),
            ..Config::default()
        };
        let cfg = cfg
            .with_overrides_from(lookup(&[("WEATHER_API_KEY", "  ")]))
            .expect("valid overrides");
        assert_eq!(cfg.api_key(), Some("FILE_KEY"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = Config::default()
            .with_overrides_from(lookup(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT must be a port number"));
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key(String::new());
        assert_eq!(cfg.api_key(), None);
    }

    #[test]
    fn parses_toml() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "KEY"
            port = 9000
            upstream_url = "http://localhost:1234"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.api_key(), Some("KEY"));
        assert_eq!(cfg.port(), 9000);
        assert_eq!(cfg.upstream_url(), "http://localhost:1234");
    }

    #[test]
    fn missing_file_loads_default() {
        let path = std::env::temp_dir().join("weather-relay-missing/config.toml");
        assert_eq!(Config::load_from(&path).expect("default"), Config::default());
    }
}
