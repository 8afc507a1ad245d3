//! Registry client configuration.
//!
//! The binary assembles these values from its layered configuration; this
//! module only validates them.

use url::Url;

/// Default member API version.
pub const DEFAULT_API_VERSION: &str = "v3";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the registry member API.
///
/// Custom `Debug` implementation redacts the `api_key` field.
#[derive(Clone)]
pub struct RegistryConfig {
    /// Registry base URL, e.g. `https://repo.aptrust.org`.
    pub base_url: Url,
    /// Member API version path segment.
    pub api_version: String,
    /// Account email, sent as `X-Pharos-API-User`.
    pub email: String,
    /// API key, sent as `X-Pharos-API-Key`.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("email", &self.email)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl RegistryConfig {
    /// Validate raw settings.
    ///
    /// An empty `api_version` falls back to [`DEFAULT_API_VERSION`].
    pub fn new(
        base_url: &str,
        api_version: &str,
        email: &str,
        api_key: &str,
    ) -> Result<Self, ConfigError> {
        if base_url.trim().is_empty() {
            return Err(ConfigError::Missing("registry URL"));
        }
        if email.trim().is_empty() {
            return Err(ConfigError::Missing("registry email"));
        }
        if api_key.trim().is_empty() {
            return Err(ConfigError::Missing("registry API key"));
        }
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(
                base_url.to_string(),
                "URL cannot be used as a base".to_string(),
            ));
        }
        let api_version = match api_version.trim() {
            "" => DEFAULT_API_VERSION.to_string(),
            v => v.to_string(),
        };
        Ok(Self {
            base_url,
            api_version,
            email: email.trim().to_string(),
            api_key: api_key.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Override the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, String),
}
