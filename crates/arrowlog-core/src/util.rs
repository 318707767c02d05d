//! Small text helpers shared by config, remote and CLI code.

/// Trim optional text, mapping blank values to `None`.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Normalize an API base URL: trimmed, http(s) only, no trailing slash.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let value = raw.trim();
    if !is_http_url(value) {
        return None;
    }
    Some(value.trim_end_matches('/').to_string())
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}
