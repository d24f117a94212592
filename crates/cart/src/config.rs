//! Cart configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `CART_API_BASE_URL` - Remote cart API root (default: <https://maisha-boutique.onrender.com>)
//! - `CART_API_TIMEOUT_SECS` - Per-request timeout; unset means no timeout
//! - `CART_DATA_DIR` - Directory for the file-backed local store (default: `.maisha`)
//! - `WHATSAPP_NUMBER` - Business number orders are sent to (default: 254799921036)
//! - `CART_DISCARD_STALE_RESPONSES` - Drop remote responses older than the
//!   latest local mutation (default: false)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "https://maisha-boutique.onrender.com";
const DEFAULT_DATA_DIR: &str = ".maisha";
const DEFAULT_WHATSAPP_NUMBER: &str = "254799921036";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart synchronizer configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Remote cart API connection settings
    pub api: CartApiConfig,
    /// Directory holding the file-backed local store
    pub data_dir: PathBuf,
    /// WhatsApp business number for order hand-off (digits only)
    pub whatsapp_number: String,
    /// Ignore remote responses superseded by a newer local mutation
    pub discard_stale_responses: bool,
}

/// Remote cart API configuration.
#[derive(Debug, Clone)]
pub struct CartApiConfig {
    /// API root; endpoint paths are joined onto it
    pub base_url: Url,
    /// Request timeout (`None` waits indefinitely)
    pub timeout: Option<Duration>,
}

impl CartApiConfig {
    /// Configuration pointing at `base_url` with no timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("CART_API_BASE_URL", base_url)?,
            timeout: None,
        })
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_source(source: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(
            "CART_API_BASE_URL",
            &get_env_or_default(source, "CART_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let timeout = get_optional_env(source, "CART_API_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar("CART_API_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?;
        let data_dir = PathBuf::from(get_env_or_default(source, "CART_DATA_DIR", DEFAULT_DATA_DIR));
        let whatsapp_number = validate_phone_number(
            "WHATSAPP_NUMBER",
            &get_env_or_default(source, "WHATSAPP_NUMBER", DEFAULT_WHATSAPP_NUMBER),
        )?;
        let discard_stale_responses = get_env_or_default(source, "CART_DISCARD_STALE_RESPONSES", "false")
            .parse::<bool>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CART_DISCARD_STALE_RESPONSES".to_string(), e.to_string())
            })?;

        Ok(Self {
            api: CartApiConfig { base_url, timeout },
            data_dir,
            whatsapp_number,
            discard_stale_responses,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(source: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    source(key).filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(source: &dyn Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional_env(source, key).unwrap_or_else(|| default.to_string())
}

/// Parse an API root, normalising it to end in exactly one slash so that
/// `Url::join` appends endpoint paths instead of replacing the last segment.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let normalised = format!("{}/", raw.trim().trim_end_matches('/'));
    let url = Url::parse(&normalised)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Strip a leading `+` and require the rest to be digits.
fn validate_phone_number(var_name: &str, raw: &str) -> Result<String, ConfigError> {
    let digits = raw.trim().trim_start_matches('+');
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must contain only digits, optionally prefixed with '+'".to_string(),
        ));
    }
    Ok(digits.to_string())
}
