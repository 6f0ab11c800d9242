use anyhow::{Context, Result};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable that overrides `[api].base_url`.
pub const API_BASE_ENV: &str = "DASHBOARD_API_BASE";

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub general: General,
    pub api: Api,
    #[serde(default)]
    pub refresh: Refresh,
    #[serde(default)]
    pub view: View,
    pub server: Option<Server>,
    pub observability: Option<Observability>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: String,
    pub request_timeout_secs: Option<u64>,
}

impl Api {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Refresh {
    pub interval_secs: u64,
}

impl Default for Refresh {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

impl Refresh {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct View {
    /// Address the dashboard view starts from when none is given on the command line.
    pub address: String,
}

impl Default for View {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:5173/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Observability {
    pub prometheus_port: u16,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        let mut config = Self::from_toml_str(&content)?;
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            config.override_api_base(base)?;
        }
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("failed to parse dashboard config")?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the upstream base address, re-running validation.
    pub fn override_api_base(&mut self, base_url: String) -> Result<()> {
        self.api.base_url = base_url;
        self.validate()
    }

    fn validate(&self) -> Result<()> {
        let base = reqwest::Url::parse(&self.api.base_url)
            .with_context(|| format!("api.base_url is not a valid URL: {}", self.api.base_url))?;
        anyhow::ensure!(
            matches!(base.scheme(), "http" | "https"),
            "api.base_url must be an http(s) URL"
        );
        anyhow::ensure!(
            self.refresh.interval_secs > 0,
            "refresh.interval_secs must be > 0"
        );
        if let Some(server) = &self.server {
            anyhow::ensure!(server.port > 0, "server.port must be > 0");
        }
        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_toml_str(s)
    }
}
