//! URL utilities for consistent endpoint construction
//!
//! Base URLs come from user configuration and may or may not carry trailing
//! slashes; these helpers keep the joined endpoint free of double slashes.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use gemchat::utils::url::normalize_base_url;
///
/// assert_eq!(
///     normalize_base_url("https://generativelanguage.googleapis.com/v1beta/"),
///     "https://generativelanguage.googleapis.com/v1beta"
/// );
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use gemchat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://example.com/v1beta/", "/models/m:generateContent"),
///     "https://example.com/v1beta/models/m:generateContent"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Endpoint path of the `generateContent` call for `model`.
pub fn generate_content_path(model: &str) -> String {
    let model = model.trim().trim_start_matches("models/");
    format!("models/{model}:generateContent")
}
