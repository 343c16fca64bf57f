use std::env;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

fn get_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn get_env_bool(key: &str, default: bool) -> bool {
    match get_env(key) {
        None => default,
        Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"),
    }
}

fn get_env_u64(key: &str, default: u64) -> Result<u64> {
    match get_env(key) {
        None => Ok(default),
        Some(v) => Ok(v
            .parse::<u64>()
            .map_err(|e| anyhow!("{key} invalid int: {e}"))?),
    }
}

fn get_env_string(key: &str, default: &str) -> String {
    get_env(key).unwrap_or_else(|| default.to_string())
}

pub const DEFAULT_METRICS_URL: &str = "http://127.0.0.1:5000/api/metrics";
pub const DEFAULT_FALLBACK: &str = "static/metrics-example.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // Sources
    pub metrics_url: String,
    pub fallback: String, // http(s) url or file path

    // Loop timing
    pub refresh_secs: u64,

    // View server
    pub dashboard_enabled: bool,
    pub dashboard_host: String,
    pub dashboard_port: u16,
    pub dashboard_open_browser: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metrics_url: DEFAULT_METRICS_URL.to_string(),
            fallback: DEFAULT_FALLBACK.to_string(),
            refresh_secs: 60,
            dashboard_enabled: true,
            dashboard_host: "127.0.0.1".to_string(),
            dashboard_port: 8000,
            dashboard_open_browser: false,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let port = get_env_u64("DASHBOARD_PORT", 8000)?;
        let dashboard_port =
            u16::try_from(port).map_err(|_| anyhow!("DASHBOARD_PORT out of range (got {port})"))?;

        let s = Self {
            metrics_url: get_env_string("METRICS_URL", DEFAULT_METRICS_URL),
            fallback: get_env_string("METRICS_FALLBACK", DEFAULT_FALLBACK),
            refresh_secs: get_env_u64("REFRESH_SECS", 60)?,
            dashboard_enabled: get_env_bool("DASHBOARD_ENABLED", true),
            dashboard_host: get_env_string("DASHBOARD_HOST", "127.0.0.1"),
            dashboard_port,
            dashboard_open_browser: get_env_bool("DASHBOARD_OPEN_BROWSER", false),
        };

        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_secs < 1 {
            return Err(anyhow!("REFRESH_SECS must be >= 1 (got {})", self.refresh_secs));
        }
        if !(self.metrics_url.starts_with("http://") || self.metrics_url.starts_with("https://")) {
            return Err(anyhow!(
                "METRICS_URL must be an http(s) url (got {})",
                self.metrics_url
            ));
        }
        if self.fallback.trim().is_empty() {
            return Err(anyhow!("METRICS_FALLBACK is empty"));
        }
        if self.dashboard_enabled && self.dashboard_host.trim().is_empty() {
            return Err(anyhow!("DASHBOARD_HOST is empty"));
        }
        Ok(())
    }

    pub fn dashboard_addr(&self) -> String {
        format!("{}:{}", self.dashboard_host, self.dashboard_port)
    }
}
