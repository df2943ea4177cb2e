//! API endpoint configuration.
//!
//! Resolution priority, per field:
//! 1. Environment variables (`CELLARNOTE_API_URL`, `CELLARNOTE_REISSUE_PATH`,
//!    `CELLARNOTE_TIMEOUT_MS`)
//! 2. Config file (`~/.config/cellarnote/config.json`)
//! 3. Built-in defaults

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Application name used for config directory paths
const APP_NAME: &str = "cellarnote";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

const DEFAULT_REISSUE_PATH: &str = "/reissue";

/// Request timeout. The backend answers from the same region; a slow
/// response is treated as a network failure.
const DEFAULT_TIMEOUT_MS: u64 = 1000;

const ENV_API_URL: &str = "CELLARNOTE_API_URL";
const ENV_REISSUE_PATH: &str = "CELLARNOTE_REISSUE_PATH";
const ENV_TIMEOUT_MS: &str = "CELLARNOTE_TIMEOUT_MS";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    api_url: Option<String>,
    reissue_path: Option<String>,
    timeout_ms: Option<u64>,
}

/// Where the base URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    Environment,
    ConfigFile,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::ConfigFile => write!(f, "config file"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub reissue_path: String,
    pub timeout: Duration,
    pub source: ConfigSource,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            reissue_path: DEFAULT_REISSUE_PATH.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            source: ConfigSource::Default,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: normalize_url(base_url.as_ref()),
            ..Self::default()
        }
    }

    pub fn with_reissue_path(mut self, path: impl AsRef<str>) -> Self {
        self.reissue_path = normalize_path(path.as_ref());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from environment, config file, and defaults.
    pub fn load() -> Self {
        Self::resolve(|key| std::env::var(key).ok(), load_config_file())
    }

    fn resolve(env: impl Fn(&str) -> Option<String>, file: Option<ConfigFile>) -> Self {
        let mut config = Self::default();
        let file = file.unwrap_or_default();

        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(env(ENV_API_URL)) {
            config.base_url = normalize_url(&url);
            config.source = ConfigSource::Environment;
        } else if let Some(url) = non_empty(file.api_url) {
            config.base_url = normalize_url(&url);
            config.source = ConfigSource::ConfigFile;
        }

        if let Some(path) = non_empty(env(ENV_REISSUE_PATH)).or(non_empty(file.reissue_path)) {
            config.reissue_path = normalize_path(&path);
        }

        let env_timeout = env(ENV_TIMEOUT_MS).and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(ms) => Some(ms),
            Err(e) => {
                warn!(value = %raw, error = %e, "Ignoring invalid {}", ENV_TIMEOUT_MS);
                None
            }
        });
        if let Some(ms) = env_timeout.or(file.timeout_ms).filter(|ms| *ms > 0) {
            config.timeout = Duration::from_millis(ms);
        }

        debug!(base_url = %config.base_url, source = %config.source, "Resolved client config");
        config
    }

    /// `~/.config/cellarnote`
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .context("Could not find config directory")?;
        Ok(config_dir.join(APP_NAME))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Full URL for `path`. The path is sent as given apart from a missing
    /// leading slash.
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim();
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub fn is_reissue_path(&self, path: &str) -> bool {
        normalize_path(path) == self.reissue_path
    }
}

fn load_config_file() -> Option<ConfigFile> {
    let path = ClientConfig::config_path().ok()?;
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                debug!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to read config file {:?}: {}", path, e);
            None
        }
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn normalize_path(path: &str) -> String {
    let path = path.trim().trim_end_matches('/');
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::resolve(env_of(&[]), None);
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.reissue_path, "/reissue");
        assert_eq!(config.timeout, Duration::from_millis(1000));
        assert_eq!(config.source, ConfigSource::Default);
    }

    #[test]
    fn test_environment_beats_file() {
        let file = ConfigFile {
            api_url: Some("https://file.example.com/".to_string()),
            reissue_path: Some("auth/reissue".to_string()),
            timeout_ms: Some(5000),
        };
        let config = ClientConfig::resolve(
            env_of(&[(ENV_API_URL, "https://env.example.com//"), (ENV_TIMEOUT_MS, "250")]),
            Some(file),
        );
        assert_eq!(config.base_url, "https://env.example.com");
        assert_eq!(config.source, ConfigSource::Environment);
        // Fields the environment leaves unset fall through to the file
        assert_eq!(config.reissue_path, "/auth/reissue");
        assert_eq!(config.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_file_used_when_env_blank() {
        let file = ConfigFile {
            api_url: Some("https://file.example.com".to_string()),
            ..ConfigFile::default()
        };
        let config = ClientConfig::resolve(env_of(&[(ENV_API_URL, "  ")]), Some(file));
        assert_eq!(config.base_url, "https://file.example.com");
        assert_eq!(config.source, ConfigSource::ConfigFile);
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let config = ClientConfig::resolve(env_of(&[(ENV_TIMEOUT_MS, "soon")]), None);
        assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_url_for_and_reissue_match() {
        let config = ClientConfig::new("http://localhost:9000/").with_reissue_path("reissue/");
        assert_eq!(config.url_for("member/info"), "http://localhost:9000/member/info");
        assert!(config.is_reissue_path("/reissue"));
        assert!(config.is_reissue_path("reissue"));
        assert!(!config.is_reissue_path("/reissue/extra"));
    }

    #[test]
    fn test_url_for_keeps_trailing_slash() {
        let config = ClientConfig::new("http://localhost:9000");
        assert_eq!(config.url_for("/wine/"), "http://localhost:9000/wine/");
        assert_eq!(config.url_for("wine/"), "http://localhost:9000/wine/");
        assert!(!config.is_reissue_path("/wine/"));
        assert!(ClientConfig::default().is_reissue_path("/reissue/"));
    }

    #[test]
    fn test_config_file_field_names() {
        let file: ConfigFile =
            serde_json::from_str(r#"{"apiUrl":"https://x","reissuePath":"/r","timeoutMs":10}"#)
                .unwrap();
        assert_eq!(file.api_url.as_deref(), Some("https://x"));
        assert_eq!(file.timeout_ms, Some(10));
    }
}
