//! Client configuration.
//!
//! One `ClientConfig` drives both the edit rules of the sync engine and the
//! HTTP remote. Bearer tokens come from the environment only and are never
//! serialized.

use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::{EditWindow, SystemClock, DEFAULT_REFERENCE_ZONE};
use crate::error::{Error, Result};
use crate::models::{DEFAULT_SHOTS_PER_END, MAX_SHOTS_PER_END, MIN_SHOTS_PER_END};
use crate::sync::{EngineSettings, HttpRemoteStore};
use crate::util::{normalize_base_url, normalize_text_option};

pub const ENV_API_BASE_URL: &str = "ARROWLOG_API_BASE_URL";
pub const ENV_API_TOKEN: &str = "ARROWLOG_API_TOKEN";
pub const ENV_TIME_ZONE: &str = "ARROWLOG_TIME_ZONE";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// Persisted client settings.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// IANA zone name anchoring "today"
    #[serde(default = "default_time_zone")]
    pub reference_time_zone: String,
    #[serde(default)]
    pub edit_window: EditWindow,
    #[serde(default = "default_shots_per_end")]
    pub default_shots_per_end: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(skip)]
    pub api_token: Option<String>,
}

fn default_time_zone() -> String {
    DEFAULT_REFERENCE_ZONE.name().to_string()
}

const fn default_shots_per_end() -> usize {
    DEFAULT_SHOTS_PER_END
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            reference_time_zone: default_time_zone(),
            edit_window: EditWindow::default(),
            default_shots_per_end: DEFAULT_SHOTS_PER_END,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            api_token: None,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field("reference_time_zone", &self.reference_time_zone)
            .field("edit_window", &self.edit_window)
            .field("default_shots_per_end", &self.default_shots_per_end)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ClientConfig {
    /// Parse a JSON config document and validate it.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.normalized()
    }

    /// Apply `ARROWLOG_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = normalize_text_option(lookup(ENV_API_BASE_URL)) {
            self.api_base_url = Some(url);
        }
        if let Some(token) = normalize_text_option(lookup(ENV_API_TOKEN)) {
            self.api_token = Some(token);
        }
        if let Some(zone) = normalize_text_option(lookup(ENV_TIME_ZONE)) {
            self.reference_time_zone = zone;
        }
        self
    }

    /// Trim values, clamp shots per end, and reject bad URLs or zones.
    pub fn normalized(mut self) -> Result<Self> {
        self.api_base_url = match normalize_text_option(self.api_base_url.take()) {
            Some(url) => Some(normalize_base_url(&url).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "API base URL '{url}' must include http:// or https://"
                ))
            })?),
            None => None,
        };
        self.reference_time_zone = self.reference_time_zone.trim().to_string();
        self.reference_zone()?;
        self.default_shots_per_end = self
            .default_shots_per_end
            .clamp(MIN_SHOTS_PER_END, MAX_SHOTS_PER_END);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        Ok(self)
    }

    pub fn reference_zone(&self) -> Result<Tz> {
        parse_time_zone(&self.reference_time_zone)
    }

    pub fn clock(&self) -> Result<SystemClock> {
        Ok(SystemClock::new(self.reference_zone()?))
    }

    pub const fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            edit_window: self.edit_window,
            default_shots_per_end: self.default_shots_per_end,
        }
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// HTTP remote for the configured API.
    pub fn remote_store(&self) -> Result<HttpRemoteStore> {
        let base_url = self.api_base_url.as_deref().ok_or_else(|| {
            Error::InvalidInput(format!(
                "No API base URL configured. Set one with `config set-api` or {ENV_API_BASE_URL}."
            ))
        })?;
        Ok(HttpRemoteStore::new(
            base_url,
            self.api_token.clone(),
            self.request_timeout(),
        )?)
    }
}

/// Resolve an IANA zone name.
pub fn parse_time_zone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| Error::InvalidInput(format!("Unknown time zone '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ClientConfig::from_json("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.reference_time_zone, "America/Los_Angeles");
        assert_eq!(config.edit_window, EditWindow::SameDay);
        assert_eq!(config.default_shots_per_end, 5);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(ClientConfig::from_json(r#"{"spreadsheet":"x"}"#).is_err());
    }

    #[test]
    fn normalizes_values() {
        let config = ClientConfig::from_json(
            r#"{
                "api_base_url": " https://archery.example.com/ ",
                "reference_time_zone": "Europe/Berlin",
                "edit_window": "unrestricted",
                "default_shots_per_end": 40
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.api_base_url.as_deref(),
            Some("https://archery.example.com")
        );
        assert_eq!(config.reference_zone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.default_shots_per_end, MAX_SHOTS_PER_END);
        assert_eq!(config.engine_settings().edit_window, EditWindow::Unrestricted);
    }

    #[test]
    fn rejects_bad_url_and_zone() {
        assert!(ClientConfig::from_json(r#"{"api_base_url":"archery.example.com"}"#).is_err());
        assert!(ClientConfig::from_json(r#"{"reference_time_zone":"Mars/Olympus"}"#).is_err());
    }

    #[test]
    fn env_overrides_win_and_token_is_not_serialized() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_API_BASE_URL, "http://localhost:3000"),
            (ENV_API_TOKEN, "secret-token"),
            (ENV_TIME_ZONE, "UTC"),
        ]);
        let config = ClientConfig::default()
            .with_overrides_from(|name| vars.get(name).map(ToString::to_string))
            .normalized()
            .unwrap();

        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.reference_zone().unwrap(), chrono_tz::UTC);
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret-token"));
        assert!(!format!("{config:?}").contains("secret-token"));
    }

    #[test]
    fn remote_store_requires_base_url() {
        assert!(ClientConfig::default().remote_store().is_err());

        let config = ClientConfig {
            api_base_url: Some("https://archery.example.com".to_string()),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.remote_store().unwrap().base_url(),
            "https://archery.example.com"
        );
    }
}
