//! Application configuration management.
//!
//! Configuration holds the backend base URL plus optional login form
//! defaults. It is read from `~/.config/authref/config.json` when that file
//! exists, then overridden by `AUTHREF_*` environment variables.
//!
//! The file is never written by the application; credentials are not kept
//! between runs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::ClientOptions;

/// Application name used for config/log directory paths
pub const APP_NAME: &str = "authref";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const ENV_BASE_URL: &str = "AUTHREF_BASE_URL";
pub const ENV_EMAIL: &str = "AUTHREF_EMAIL";
pub const ENV_PASSWORD: &str = "AUTHREF_PASSWORD";
pub const ENV_ORG_ID: &str = "AUTHREF_ORG_ID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// Pre-fills the email field
    pub email: Option<String>,
    pub org_id: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Pre-fills the password field. Only ever set from the environment.
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            email: None,
            org_id: None,
            request_timeout_secs: None,
            password: None,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Override fields from environment variables looked up through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = get(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(email) = get(ENV_EMAIL) {
            self.email = Some(email);
        }
        if let Some(password) = get(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(org_id) = get(ENV_ORG_ID) {
            self.org_id = Some(org_id);
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            org_id: self.org_id.clone(),
            timeout_secs: self.request_timeout_secs,
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the log file
    pub fn log_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
