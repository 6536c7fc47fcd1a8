use std::time::Duration;

use crate::core::completion::{ClientConfig, RetryPolicy};
use crate::core::config::data::Config;

/// Environment variable consulted when the config file has no key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

impl Config {
    /// Key from the config file, falling back to `GEMINI_API_KEY`.
    pub fn resolve_api_key(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| env(API_KEY_ENV).filter(|key| !key.trim().is_empty()))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            base_delay: self
                .retry_base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
        }
    }

    /// Build the client configuration. A missing key is passed through as an
    /// empty string; the endpoint reports it as an API error.
    pub fn client_config(
        &self,
        model_override: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ClientConfig {
        let mut config = ClientConfig::new(self.resolve_api_key(env).unwrap_or_default())
            .with_retry(self.retry_policy());
        if let Some(model) = model_override.or(self.model.as_deref()) {
            config = config.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        config
    }

    pub fn client_config_from_env(&self, model_override: Option<&str>) -> ClientConfig {
        self.client_config(model_override, |name| std::env::var(name).ok())
    }
}
