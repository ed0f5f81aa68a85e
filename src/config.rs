//! Environment configuration for the client and the development backend

use crate::state_machine::state::DEFAULT_WELCOME_DELAY;
use crate::state_machine::ChatContext;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_BRAND_ID: &str = "cristello";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_DEV_PORT: u16 = 8000;
pub const DEFAULT_DEV_BRANDS: &[&str] = &["miloe", "cristello"];

/// `RUST_LOG` fallback for the terminal client; stderr shares the terminal
/// with the transcript, so only warnings are shown
pub const CLIENT_LOG_FILTER: &str = "chat_widget=warn";
/// `RUST_LOG` fallback for the development backend
pub const DEV_BACKEND_LOG_FILTER: &str = "chat_widget=info,tower_http=debug";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

/// Settings for the chat client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub backend_url: String,
    pub brand_id: String,
    pub welcome_delay: Duration,
    /// `None` waits on the backend indefinitely
    pub request_timeout: Option<Duration>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            brand_id: DEFAULT_BRAND_ID.to_string(),
            welcome_delay: DEFAULT_WELCOME_DELAY,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl WidgetConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let welcome_delay = parse_var::<u64>(&lookup, "CHAT_WELCOME_DELAY_MS")?
            .map_or(defaults.welcome_delay, Duration::from_millis);
        let request_timeout = match parse_var::<u64>(&lookup, "CHAT_REQUEST_TIMEOUT_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.request_timeout,
        };

        Ok(Self {
            backend_url: string_var(&lookup, "CHAT_BACKEND_URL")?
                .unwrap_or(defaults.backend_url),
            brand_id: string_var(&lookup, "CHAT_BRAND_ID")?.unwrap_or(defaults.brand_id),
            welcome_delay,
            request_timeout,
        })
    }
}

impl From<&WidgetConfig> for ChatContext {
    fn from(config: &WidgetConfig) -> Self {
        ChatContext::new(config.brand_id.clone()).with_welcome_delay(config.welcome_delay)
    }
}

/// Settings for the development backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevBackendConfig {
    pub port: u16,
    /// Brand ids accepted by `/start_session`
    pub brands: Vec<String>,
}

impl Default for DevBackendConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_DEV_PORT,
            brands: DEFAULT_DEV_BRANDS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl DevBackendConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = parse_var::<u16>(&lookup, "DEV_BACKEND_PORT")?.unwrap_or(defaults.port);
        let brands = match lookup("DEV_BACKEND_BRANDS") {
            Some(raw) => {
                let brands: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|b| !b.is_empty())
                    .map(str::to_lowercase)
                    .collect();
                if brands.is_empty() {
                    return Err(ConfigError::Empty {
                        key: "DEV_BACKEND_BRANDS",
                    });
                }
                brands
            }
            None => defaults.brands,
        };

        Ok(Self { port, brands })
    }
}

fn string_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<String>, ConfigError> {
    match lookup(key) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { key }),
        Some(value) => Ok(Some(value.trim().to_string())),
        None => Ok(None),
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        None => Ok(None),
    }
}
