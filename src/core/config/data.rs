use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Credential sent as the `key` query parameter
    pub api_key: Option<String>,
    /// Model name, e.g. "gemini-1.5-flash"
    pub model: Option<String>,
    /// API base URL up to and including the version segment
    pub base_url: Option<String>,
    /// Retries allowed after a rate-limited response
    pub max_retries: Option<u32>,
    /// First backoff wait in milliseconds; doubles on each retry
    pub retry_base_delay_ms: Option<u64>,
}

/// Keys accepted by `gemchat set` / `gemchat unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ApiKey,
    Model,
    BaseUrl,
    MaxRetries,
    RetryBaseDelayMs,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::ApiKey,
        ConfigKey::Model,
        ConfigKey::BaseUrl,
        ConfigKey::MaxRetries,
        ConfigKey::RetryBaseDelayMs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::ApiKey => "api-key",
            ConfigKey::Model => "model",
            ConfigKey::BaseUrl => "base-url",
            ConfigKey::MaxRetries => "max-retries",
            ConfigKey::RetryBaseDelayMs => "retry-base-delay-ms",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == value)
            .ok_or_else(|| {
                let known: Vec<&str> = ConfigKey::ALL.iter().map(|key| key.as_str()).collect();
                format!("Unknown config key: {value} (expected one of: {})", known.join(", "))
            })
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for {key}"));
        }
        match key {
            ConfigKey::ApiKey => self.api_key = Some(value.to_string()),
            ConfigKey::Model => self.model = Some(value.to_string()),
            ConfigKey::BaseUrl => self.base_url = Some(value.to_string()),
            ConfigKey::MaxRetries => {
                let parsed = value
                    .parse::<u32>()
                    .map_err(|err| format!("Invalid {key} '{value}': {err}"))?;
                self.max_retries = Some(parsed);
            }
            ConfigKey::RetryBaseDelayMs => {
                let parsed = value
                    .parse::<u64>()
                    .map_err(|err| format!("Invalid {key} '{value}': {err}"))?;
                self.retry_base_delay_ms = Some(parsed);
            }
        }
        Ok(())
    }

    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::ApiKey => self.api_key = None,
            ConfigKey::Model => self.model = None,
            ConfigKey::BaseUrl => self.base_url = None,
            ConfigKey::MaxRetries => self.max_retries = None,
            ConfigKey::RetryBaseDelayMs => self.retry_base_delay_ms = None,
        }
    }
}
