//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global configuration for f5500
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub archive: ArchiveConfig,
    pub source: SourceConfig,
    pub http: HttpSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub root: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("Datasets"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: f5500_archive::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// Seconds without a received chunk before a download is considered stalled
    pub read_timeout: u64,
    pub max_retries: u32,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            read_timeout: 30,
            max_retries: 3,
        }
    }
}

/// Deserialize a string that may be an environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    expand_env_var(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("environment variable in {s} is not set")))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./f5500.toml (current directory)
    /// 2. ~/.config/f5500/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("f5500.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "f5500") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.archive.root, PathBuf::from("Datasets"));
        assert_eq!(config.source.base_url, f5500_archive::DEFAULT_BASE_URL);
        assert_eq!(config.http.read_timeout, 30);
        assert_eq!(config.http.max_retries, 3);
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("F5500_TEST_MIRROR", "http://mirror.local");
        assert_eq!(
            expand_env_var("${F5500_TEST_MIRROR}"),
            Some("http://mirror.local".to_string())
        );
        std::env::remove_var("F5500_TEST_MIRROR");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[archive]
root = "/srv/form5500"

[source]
base_url = "http://localhost:8000/foia"

[http]
max_retries = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.archive.root, PathBuf::from("/srv/form5500"));
        assert_eq!(config.source.base_url, "http://localhost:8000/foia");
        assert_eq!(config.http.max_retries, 5);
        assert_eq!(config.http.read_timeout, 30);
    }

    #[test]
    fn unset_base_url_variable_is_an_error() {
        let toml = r#"
[source]
base_url = "${NONEXISTENT_VAR_67890}"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f5500.toml");
        std::fs::write(&path, "[archive]\nroot = \"data\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.archive.root, PathBuf::from("data"));
    }
}
