//! Environment-driven configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `D2C_DATA_DIR` | `.d2c-calculators` |
//! | `INSIGHT_BACKEND` | `gemini` (or `mock`) |
//! | `GEMINI_API_KEY` | none; without it the gemini backend is unavailable |
//! | `GEMINI_MODEL` | `gemini-2.5-flash` |
//! | `GEMINI_HOST` | `https://generativelanguage.googleapis.com` |
//! | `INSIGHT_TIMEOUT_SECS` | `60` |
//! | `D2C_USER_AGENT` | none |

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::input::parse_or_default;

pub const DEFAULT_DATA_DIR: &str = ".d2c-calculators";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const STORE_FILE: &str = "local_store.json";
const EVENTS_FILE: &str = "events.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Gemini,
    Mock,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(BackendKind::Gemini),
            "mock" => Ok(BackendKind::Mock),
            other => Err(Error::Config(format!("Unknown insight backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub backend: BackendKind,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_host: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            backend: BackendKind::Gemini,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_host: DEFAULT_GEMINI_HOST.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let backend = match get("INSIGHT_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.backend,
        };

        let timeout_secs = get("INSIGHT_TIMEOUT_SECS")
            .map(|v| parse_or_default(&v))
            .filter(|secs| *secs >= 1.0)
            .map(|secs| secs as u64)
            .unwrap_or(defaults.timeout_secs);

        Ok(Self {
            data_dir: get("D2C_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            backend,
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_host: get("GEMINI_HOST")
                .map(|h| h.trim_end_matches('/').to_string())
                .unwrap_or(defaults.gemini_host),
            timeout_secs,
            user_agent: get("D2C_USER_AGENT"),
        })
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    pub fn events_path(&self) -> PathBuf {
        self.data_dir.join(EVENTS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, Error> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c, AppConfig::default());
        assert_eq!(c.store_path(), PathBuf::from(".d2c-calculators/local_store.json"));
        assert_eq!(c.events_path(), PathBuf::from(".d2c-calculators/events.jsonl"));
    }

    #[test]
    fn test_overrides() {
        let c = config(&[
            ("D2C_DATA_DIR", "/tmp/d2c"),
            ("INSIGHT_BACKEND", "Mock"),
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_HOST", "http://localhost:8080/"),
            ("INSIGHT_TIMEOUT_SECS", "15"),
            ("D2C_USER_AGENT", "curl/8"),
        ])
        .unwrap();

        assert_eq!(c.data_dir, PathBuf::from("/tmp/d2c"));
        assert_eq!(c.backend, BackendKind::Mock);
        assert_eq!(c.gemini_api_key.as_deref(), Some("k"));
        assert_eq!(c.gemini_host, "http://localhost:8080");
        assert_eq!(c.timeout_secs, 15);
        assert_eq!(c.user_agent.as_deref(), Some("curl/8"));
    }

    #[test]
    fn test_bad_values() {
        assert!(matches!(config(&[("INSIGHT_BACKEND", "openai")]), Err(Error::Config(_))));

        let c = config(&[("INSIGHT_TIMEOUT_SECS", "soon"), ("GEMINI_API_KEY", "  ")]).unwrap();
        assert_eq!(c.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(c.gemini_api_key, None);
    }
}
