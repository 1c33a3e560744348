//! Configuration - org endpoint and credentials
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `~/.sfmeta/config.json`
//! 3. Environment (`SF_INSTANCE_URL`, `SF_ACCESS_TOKEN`, `SF_API_VERSION`, `SF_TIMEOUT_SECS`)
//! 4. CLI flags (applied by the binaries)

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_VERSION: &str = "60.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Org base URL (e.g., https://acme.my.salesforce.com)
    pub instance_url: String,
    /// OAuth access token / session id
    pub access_token: String,
    /// REST API version without the leading `v`
    pub api_version: String,
    /// HTTP request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instance_url: String::new(),
            access_token: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// sfmeta data directory (~/.sfmeta/)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".sfmeta")
    }

    /// Path to the config file
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from the default file, then apply the process environment
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("no config file at {}", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Override fields from environment variables, looked up through `get`
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("SF_INSTANCE_URL") { self.instance_url = v; }
        if let Some(v) = get("SF_ACCESS_TOKEN") { self.access_token = v; }
        if let Some(v) = get("SF_API_VERSION") { self.api_version = v; }
        if let Some(v) = get("SF_TIMEOUT_SECS") {
            match v.trim().parse() {
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => tracing::warn!("ignoring invalid SF_TIMEOUT_SECS={}", v),
            }
        }
    }

    /// Override fields from command line flags
    pub fn apply_flags(
        &mut self,
        instance_url: Option<String>,
        access_token: Option<String>,
        api_version: Option<String>,
    ) {
        if let Some(v) = instance_url { self.instance_url = v; }
        if let Some(v) = access_token { self.access_token = v; }
        if let Some(v) = api_version { self.api_version = v; }
    }
}
