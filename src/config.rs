//! Process-wide settings, passed explicitly to the transport and consent store.

use std::path::PathBuf;
use std::time::Duration;

/// Local development server (`/search` on port 8000).
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/search";
/// Storage key for the disclaimer acknowledgement.
pub const CONSENT_KEY: &str = "cra.disclaimer.acknowledged";

pub const ENV_ENDPOINT: &str = "CRA_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "CRA_TIMEOUT_SECS";
pub const ENV_CONFIG_FILE: &str = "CRA_CONFIG_FILE";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Full URL of the search endpoint, query string excluded.
    pub endpoint: String,
    /// Request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// JSON file holding persisted preferences.
    pub consent_path: PathBuf,
    pub consent_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
            consent_path: default_preferences_path(),
            consent_key: CONSENT_KEY.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `CRA_ENDPOINT`, `CRA_TIMEOUT_SECS` and `CRA_CONFIG_FILE`.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|k| std::env::var(k).ok())
    }

    /// Apply overrides from any key/value source (the environment in production).
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|s| !s.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            match secs.trim().parse::<u64>() {
                Ok(0) => self.timeout = None,
                Ok(s) => self.timeout = Some(Duration::from_secs(s)),
                Err(_) => log::warn!("ignoring invalid {ENV_TIMEOUT_SECS}={secs:?}"),
            }
        }
        if let Some(path) = lookup(ENV_CONFIG_FILE).filter(|s| !s.trim().is_empty()) {
            self.consent_path = PathBuf::from(path);
        }
        self
    }
}

fn default_preferences_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cra-rs")
        .join("preferences.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn overrides_apply_and_zero_timeout_disables() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, " http://example.test/search "),
            (ENV_TIMEOUT_SECS, "0"),
            (ENV_CONFIG_FILE, "/tmp/cra-prefs.json"),
        ]
        .into_iter()
        .collect();
        let cfg = Config {
            timeout: Some(Duration::from_secs(5)),
            ..Config::default()
        }
        .with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.endpoint, "http://example.test/search");
        assert_eq!(cfg.timeout, None);
        assert_eq!(cfg.consent_path, PathBuf::from("/tmp/cra-prefs.json"));
        assert_eq!(cfg.consent_key, CONSENT_KEY);
    }

    #[test]
    fn invalid_timeout_is_ignored() {
        let cfg = Config::default().with_overrides(|k| {
            (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert_eq!(cfg.timeout, None);
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }
}
