use crate::core::config::data::Config;

fn or_unset(value: Option<String>) -> String {
    value.unwrap_or_else(|| "(unset)".to_string())
}

/// Show only enough of the key to tell two keys apart.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("****{visible}")
}

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!(
            "  api-key: {}",
            or_unset(self.api_key.as_deref().map(mask_secret))
        );
        println!("  model: {}", or_unset(self.model.clone()));
        println!("  base-url: {}", or_unset(self.base_url.clone()));
        println!(
            "  max-retries: {}",
            or_unset(self.max_retries.map(|v| v.to_string()))
        );
        println!(
            "  retry-base-delay-ms: {}",
            or_unset(self.retry_base_delay_ms.map(|v| v.to_string()))
        );
    }
}
