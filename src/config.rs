//! Client configuration.
//!
//! Values are layered, lowest precedence first:
//! 1. built-in defaults
//! 2. `<config dir>/notehub/config.json`
//! 3. environment variables (`NOTEHUB_URL`, `NOTEHUB_TOKEN`, `NOTEHUB_PER_PAGE`,
//!    `NOTEHUB_DEBOUNCE_MS`)
//! 4. command-line flags, applied by the binary
//!
//! The resulting [`Config`] is handed to the client and the cache explicitly;
//! nothing else in the crate reads the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "notehub";
const CONFIG_FILE: &str = "config.json";

/// Public NoteHub deployment.
pub const DEFAULT_BASE_URL: &str = "https://notehub-public.goit.study/api";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// Bearer token. Not validated locally; a missing token surfaces as a 401.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub per_page: u32,
    pub debounce_ms: u64,
    /// Extra attempts for a failed list fetch.
    pub retry: u32,
    /// How long a successful listing counts as fresh. Zero refetches on every observation.
    pub stale_time_ms: u64,
    /// How long a listing nobody has observed stays cached.
    pub gc_time_secs: u64,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            per_page: 12,
            debounce_ms: 300,
            retry: 1,
            stale_time_ms: 0,
            gc_time_secs: 300,
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Defaults, then the user config file, then the process environment.
    pub fn load() -> Self {
        let mut config = match default_config_path() {
            Some(path) => Self::from_file(&path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }),
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Read a JSON config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config.normalized())
    }

    /// Override fields from environment-style lookups. Unparseable numbers are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("NOTEHUB_URL") {
            self.base_url = url;
        }
        if let Some(token) = lookup("NOTEHUB_TOKEN") {
            self.token = Some(token);
        }
        if let Some(per_page) = lookup("NOTEHUB_PER_PAGE").and_then(|s| s.parse().ok()) {
            self.per_page = per_page;
        }
        if let Some(ms) = lookup("NOTEHUB_DEBOUNCE_MS").and_then(|s| s.parse().ok()) {
            self.debounce_ms = ms;
        }
        *self = std::mem::take(self).normalized();
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_time_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn normalized(mut self) -> Self {
        self.token = self.token.filter(|t| !t.trim().is_empty());
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self.per_page = self.per_page.max(1);
        self
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let mut path = config_dir()?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Some(path)
}
