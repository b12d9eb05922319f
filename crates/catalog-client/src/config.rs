//! Harvester configuration and builder pattern.

use crate::error::{ClientError, Result};
use std::fmt;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Environment variable holding the workspace host URL.
pub const HOST_ENV: &str = "DATABRICKS_HOST";

/// Environment variable holding the bearer token.
pub const TOKEN_ENV: &str = "DATABRICKS_TOKEN";

/// Configuration for one harvester.
///
/// Gate capacity and retry parameters are resolved once here and threaded
/// through every fetch of a run.
///
/// # Security
///
/// The `Debug` implementation masks the token to prevent accidental exposure
/// in logs. The token is shown as `"***REDACTED***"` in debug output.
#[derive(Clone)]
pub struct HarvestConfig {
    /// Workspace host URL (e.g., "https://adb-123.azuredatabricks.net")
    pub host: String,
    /// Bearer token sent with every request
    pub token: String,
    /// Capacity of the concurrency gate (default: 8)
    pub max_concurrent_requests: usize,
    /// Total attempts per fetch when rate limited (default: 5)
    pub max_retries: u32,
    /// Delay after the first rate-limited attempt (default: 500ms)
    pub base_delay: Duration,
    /// Per-request timeout (default: 30 seconds)
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            token: String::new(),
            max_concurrent_requests: 8,
            max_retries: 5,
            base_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
            user_agent: format!("ucharvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("host", &self.host)
            .field("token", &"***REDACTED***")
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl HarvestConfig {
    /// Create a new configuration builder.
    pub fn builder(host: impl Into<String>, token: impl Into<String>) -> HarvestConfigBuilder {
        HarvestConfigBuilder::new(host, token)
    }

    /// Create a builder seeded with credentials from `DATABRICKS_HOST` and
    /// `DATABRICKS_TOKEN`.
    ///
    /// Fails when either variable is unset or empty.
    pub fn from_env() -> Result<HarvestConfigBuilder> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`HarvestConfig::from_env`], reading variables through `lookup`.
    ///
    /// Values are trimmed; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<HarvestConfigBuilder>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = read_var(&lookup, HOST_ENV)?;
        let token = read_var(&lookup, TOKEN_ENV)?;
        Ok(HarvestConfigBuilder::new(host, token))
    }

    /// Minimum allowed timeout value.
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(100);

    /// Root of the REST API under the configured host.
    pub fn api_root(&self) -> String {
        format!("{}/api/2.1/", self.host.trim_end_matches('/'))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(ClientError::Config("host cannot be empty".to_string()));
        }

        url::Url::parse(&self.host)
            .map_err(|e| ClientError::Config(format!("Invalid host: {}", e)))?;

        if self.token.is_empty() {
            return Err(ClientError::Config("token cannot be empty".to_string()));
        }

        if self.max_concurrent_requests == 0 {
            return Err(ClientError::Config(
                "max_concurrent_requests must be > 0".to_string(),
            ));
        }

        if self.max_concurrent_requests > Semaphore::MAX_PERMITS {
            return Err(ClientError::Config(format!(
                "max_concurrent_requests must be <= {}",
                Semaphore::MAX_PERMITS
            )));
        }

        if self.max_retries == 0 {
            return Err(ClientError::Config("max_retries must be > 0".to_string()));
        }

        if self.timeout < Self::MIN_TIMEOUT {
            return Err(ClientError::Config(format!(
                "timeout ({:?}) must be >= {:?}",
                self.timeout,
                Self::MIN_TIMEOUT
            )));
        }

        Ok(())
    }
}

fn read_var<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ClientError::Config(format!(
            "{} must be set in the environment",
            name
        ))),
    }
}

/// Builder for harvester configuration.
#[derive(Debug)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    /// Create a new builder with the given credentials.
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            config: HarvestConfig {
                host: host.into(),
                token: token.into(),
                ..Default::default()
            },
        }
    }

    /// Set the capacity of the concurrency gate.
    pub fn max_concurrent_requests(mut self, permits: usize) -> Self {
        self.config.max_concurrent_requests = permits;
        self
    }

    /// Set the total number of attempts per fetch.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the delay that follows the first rate-limited attempt.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration, validating all settings.
    pub fn build(self) -> Result<HarvestConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = HarvestConfig::default();
        assert_eq!(config.max_concurrent_requests, 8);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay, Duration::from_millis(500));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let config = HarvestConfig::builder("https://adb-1.example.net", "dapi123")
            .max_concurrent_requests(2)
            .max_retries(3)
            .base_delay(Duration::from_millis(50))
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.host, "https://adb-1.example.net");
        assert_eq!(config.token, "dapi123");
        assert_eq!(config.max_concurrent_requests, 2);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_api_root_strips_trailing_slash() {
        let config = HarvestConfig::builder("https://adb-1.example.net/", "t")
            .build()
            .unwrap();
        assert_eq!(config.api_root(), "https://adb-1.example.net/api/2.1/");
    }

    #[test]
    fn test_invalid_host() {
        assert!(HarvestConfig::builder("not a url", "t").build().is_err());
        assert!(HarvestConfig::builder("", "t").build().is_err());
    }

    #[test]
    fn test_empty_token() {
        let err = HarvestConfig::builder("https://adb-1.example.net", "")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn test_zero_gate_rejected() {
        let err = HarvestConfig::builder("https://adb-1.example.net", "t")
            .max_concurrent_requests(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_concurrent_requests"));
    }

    #[test]
    fn test_oversized_gate_rejected() {
        let err = HarvestConfig::builder("https://adb-1.example.net", "t")
            .max_concurrent_requests(usize::MAX)
            .build()
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("max_concurrent_requests"));

        let config = HarvestConfig::builder("https://adb-1.example.net", "t")
            .max_concurrent_requests(Semaphore::MAX_PERMITS)
            .build();
        assert!(config.is_ok());
    }

    #[test]
    fn test_zero_retries_rejected() {
        let result = HarvestConfig::builder("https://adb-1.example.net", "t")
            .max_retries(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_too_small() {
        let err = HarvestConfig::builder("https://adb-1.example.net", "t")
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_token_masked_in_debug() {
        let config = HarvestConfig::builder("https://adb-1.example.net", "dapi_super_secret")
            .build()
            .unwrap();

        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("dapi_super_secret"));
        assert!(debug_output.contains("REDACTED"));
    }

    #[test]
    fn test_from_lookup_reads_credentials() {
        let config = HarvestConfig::from_lookup(lookup_from(&[
            (HOST_ENV, "https://adb-1.example.net"),
            (TOKEN_ENV, "dapi123"),
        ]))
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(config.host, "https://adb-1.example.net");
        assert_eq!(config.token, "dapi123");
        assert_eq!(config.max_concurrent_requests, 8);
    }

    #[test]
    fn test_from_lookup_missing_host() {
        let lookup = lookup_from(&[(TOKEN_ENV, "dapi123")]);
        let err = HarvestConfig::from_lookup(lookup).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains(HOST_ENV));
    }

    #[test]
    fn test_from_lookup_missing_token() {
        let lookup = lookup_from(&[(HOST_ENV, "https://adb-1.example.net")]);
        let err = HarvestConfig::from_lookup(lookup).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains(TOKEN_ENV));
    }

    #[test]
    fn test_from_lookup_blank_value_is_unset() {
        let err = HarvestConfig::from_lookup(lookup_from(&[
            (HOST_ENV, "https://adb-1.example.net"),
            (TOKEN_ENV, "   \t"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(TOKEN_ENV));
    }

    #[test]
    fn test_from_lookup_trims_values() {
        let builder = HarvestConfig::from_lookup(lookup_from(&[
            (HOST_ENV, "  https://adb-1.example.net/\n"),
            (TOKEN_ENV, " dapi123 "),
        ]))
        .unwrap();
        let config = builder.build().unwrap();

        assert_eq!(config.host, "https://adb-1.example.net/");
        assert_eq!(config.token, "dapi123");
        assert_eq!(config.api_root(), "https://adb-1.example.net/api/2.1/");
    }
}
