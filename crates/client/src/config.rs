//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHOPFRONT_API_URL` - Base URL of the REST API (default: `http://localhost:5000/api`)
//! - `SHOPFRONT_PROFILE_DIR` - Directory holding the local cart, coupon and session records
//!   (default: `.shopfront`)
//! - `SHOPFRONT_CATALOG_CACHE_TTL_SECS` - How long product listings stay cached (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: `development`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5000/api";
const DEFAULT_PROFILE_DIR: &str = ".shopfront";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API configuration
    pub api: ApiConfig,
    /// Directory for the local records
    pub profile_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: String,
}

/// REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Time-to-live of cached catalog responses
    pub catalog_cache_ttl: Duration,
}

impl ApiConfig {
    /// Configuration for an API at `base_url` with the default cache TTL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("SHOPFRONT_API_URL", base_url)?,
            catalog_cache_ttl: Duration::from_secs(300),
        })
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(
            "SHOPFRONT_API_URL",
            &get_env_or_default("SHOPFRONT_API_URL", DEFAULT_API_URL),
        )?;
        let ttl_secs = get_env_or_default(
            "SHOPFRONT_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar(
                "SHOPFRONT_CATALOG_CACHE_TTL_SECS".to_string(),
                e.to_string(),
            )
        })?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                catalog_cache_ttl: Duration::from_secs(ttl_secs),
            },
            profile_dir: PathBuf::from(get_env_or_default(
                "SHOPFRONT_PROFILE_DIR",
                DEFAULT_PROFILE_DIR,
            )),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_env_or_default("SENTRY_ENVIRONMENT", "development"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL, making sure it ends with a slash so that
/// [`Url::join`] appends to its path instead of replacing the last segment.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("X", "http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            url.join("cart").unwrap().as_str(),
            "http://localhost:5000/api/cart"
        );
    }

    #[test]
    fn test_base_url_keeps_existing_slash() {
        let url = parse_base_url("X", "https://shop.example.in/api/").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.in/api/");
    }

    #[test]
    fn test_base_url_rejects_garbage() {
        assert!(matches!(
            parse_base_url("SHOPFRONT_API_URL", "not a url"),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "SHOPFRONT_API_URL"
        ));
        assert!(parse_base_url("X", "ftp://example.com/api").is_err());
    }

    #[test]
    fn test_api_config_default_ttl() {
        let config = ApiConfig::new("http://127.0.0.1:9/api").unwrap();
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(300));
    }
}
