//! Runtime configuration for the ad platform connection.

use std::time::Duration;

use adsync_core::classification::MessageMode;
use adsync_core::constants::{CREDENTIAL_MAX_AGE_DAYS, DEFAULT_CURRENCY};
use adsync_core::errors::{Result, ValidationError};

/// Default base URL of the remote ad platform API.
pub const DEFAULT_API_URL: &str = "https://api.pinterest.com/v5";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REFRESH_MARGIN_HOURS: i64 = 24;
const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub api_base_url: String,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
    pub request_timeout: Duration,
    /// Refresh the credential once it is this close to the 30-day limit.
    pub credential_refresh_margin: chrono::Duration,
    /// Attempts for one load-merge-save cycle before a write conflict is returned.
    pub max_write_attempts: u32,
    pub production_safe_errors: bool,
    pub default_currency: String,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            oauth_client_id: None,
            oauth_client_secret: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            credential_refresh_margin: chrono::Duration::hours(DEFAULT_REFRESH_MARGIN_HOURS),
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
            production_safe_errors: false,
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl ConnectConfig {
    /// Reads `ADSYNC_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset or blank keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = get("ADSYNC_API_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        config.oauth_client_id = get("ADSYNC_OAUTH_CLIENT_ID");
        config.oauth_client_secret = get("ADSYNC_OAUTH_CLIENT_SECRET");

        if let Some(raw) = get("ADSYNC_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_var("ADSYNC_REQUEST_TIMEOUT_SECS", &raw)?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get("ADSYNC_REFRESH_MARGIN_HOURS") {
            let hours: i64 = parse_var("ADSYNC_REFRESH_MARGIN_HOURS", &raw)?;
            config.credential_refresh_margin = refresh_margin(hours)?;
        }
        if let Some(raw) = get("ADSYNC_MAX_WRITE_ATTEMPTS") {
            let attempts: u32 = parse_var("ADSYNC_MAX_WRITE_ATTEMPTS", &raw)?;
            if attempts == 0 {
                return Err(ValidationError::InvalidInput(
                    "ADSYNC_MAX_WRITE_ATTEMPTS must be at least 1".to_string(),
                )
                .into());
            }
            config.max_write_attempts = attempts;
        }
        if let Some(raw) = get("ADSYNC_PRODUCTION_ERRORS") {
            config.production_safe_errors = match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ValidationError::InvalidInput(format!(
                        "ADSYNC_PRODUCTION_ERRORS: expected a boolean, got '{}'",
                        raw
                    ))
                    .into())
                }
            };
        }
        if let Some(currency) = get("ADSYNC_DEFAULT_CURRENCY") {
            config.default_currency = currency.to_ascii_uppercase();
        }

        Ok(config)
    }

    pub fn message_mode(&self) -> MessageMode {
        if self.production_safe_errors {
            MessageMode::ProductionSafe
        } else {
            MessageMode::Verbose
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse().map_err(|_| {
        ValidationError::InvalidInput(format!("{}: invalid value '{}'", key, raw)).into()
    })
}

/// A margin in `[0, 30 days)`; anything larger would refresh on every call.
fn refresh_margin(hours: i64) -> Result<chrono::Duration> {
    let max_hours = CREDENTIAL_MAX_AGE_DAYS * 24;
    if !(0..max_hours).contains(&hours) {
        return Err(ValidationError::InvalidInput(format!(
            "ADSYNC_REFRESH_MARGIN_HOURS: must be between 0 and {} hours, got {}",
            max_hours - 1,
            hours
        ))
        .into());
    }
    chrono::Duration::try_hours(hours).ok_or_else(|| {
        ValidationError::InvalidInput(format!(
            "ADSYNC_REFRESH_MARGIN_HOURS: {} hours is out of range",
            hours
        ))
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = ConnectConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.credential_refresh_margin, chrono::Duration::hours(24));
        assert_eq!(config.max_write_attempts, 3);
        assert_eq!(config.default_currency, "EUR");
        assert_eq!(config.message_mode(), MessageMode::Verbose);
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = ConnectConfig::from_lookup(lookup(&[
            ("ADSYNC_API_URL", "http://localhost:9000/v5/"),
            ("ADSYNC_OAUTH_CLIENT_ID", "client"),
            ("ADSYNC_REQUEST_TIMEOUT_SECS", "5"),
            ("ADSYNC_MAX_WRITE_ATTEMPTS", "7"),
            ("ADSYNC_PRODUCTION_ERRORS", "true"),
            ("ADSYNC_DEFAULT_CURRENCY", "usd"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:9000/v5");
        assert_eq!(config.oauth_client_id.as_deref(), Some("client"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_write_attempts, 7);
        assert_eq!(config.message_mode(), MessageMode::ProductionSafe);
        assert_eq!(config.default_currency, "USD");
    }

    #[test]
    fn test_refresh_margin_bounds() {
        for raw in ["-1", "720", "9223372036854775807"] {
            let err = ConnectConfig::from_lookup(lookup(&[("ADSYNC_REFRESH_MARGIN_HOURS", raw)]))
                .unwrap_err();
            assert!(err.to_string().contains("ADSYNC_REFRESH_MARGIN_HOURS"), "{}", raw);
        }

        let config =
            ConnectConfig::from_lookup(lookup(&[("ADSYNC_REFRESH_MARGIN_HOURS", "719")])).unwrap();
        assert_eq!(config.credential_refresh_margin, chrono::Duration::hours(719));
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = ConnectConfig::from_lookup(lookup(&[("ADSYNC_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("ADSYNC_REQUEST_TIMEOUT_SECS"));

        assert!(ConnectConfig::from_lookup(lookup(&[("ADSYNC_MAX_WRITE_ATTEMPTS", "0")])).is_err());
        assert!(ConnectConfig::from_lookup(lookup(&[("ADSYNC_PRODUCTION_ERRORS", "maybe")])).is_err());
    }
}
