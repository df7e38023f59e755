use anyhow::{Context, Result, anyhow};
use std::env;
use std::time::Duration;

use crate::ai::{DEFAULT_API_URL, DEFAULT_MODEL, resolve_model};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Missing credential is allowed; every gateway call then reports `NotConfigured`.
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("Failed to load .env file");
            }
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = parse_api_key(lookup("TOGETHER_API_KEY"));

        let model = match lookup("TALENTSCOUT_MODEL").filter(|s| !s.trim().is_empty()) {
            Some(name) => resolve_model(name.trim())?,
            None => DEFAULT_MODEL.to_string(),
        };

        let api_url = lookup("TALENTSCOUT_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs = match lookup("TALENTSCOUT_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("TALENTSCOUT_TIMEOUT_SECS must be a valid number")?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(anyhow!("TALENTSCOUT_TIMEOUT_SECS must be greater than zero"));
        }

        Ok(Config {
            api_key,
            model,
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn with_model(mut self, name: &str) -> Result<Self> {
        self.model = resolve_model(name)?;
        Ok(self)
    }
}

/// Blank or whitespace-only keys count as unset.
pub fn parse_api_key(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
