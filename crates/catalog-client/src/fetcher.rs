//! Gated HTTP GET with exponential backoff on rate limiting.
//!
//! A [`BackoffFetcher`] is the session scope of one harvesting run: it owns
//! the HTTP client, the concurrency gate and the retry policy, and is dropped
//! when the run ends. Every request of the run goes through [`BackoffFetcher::fetch`].
//!
//! # Permit discipline
//!
//! A gate permit covers exactly one HTTP round trip. On a 429 the permit is
//! returned before the backoff sleep so other requests can proceed while this
//! one waits.

use crate::config::HarvestConfig;
use crate::error::{ClientError, Result};
use crate::gate::ConcurrencyGate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::{Duration, Instant};

/// One GET request against the catalog API: a path under `/api/2.1/` plus
/// query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    path: String,
    query: Vec<(&'static str, String)>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    /// `unity-catalog/catalogs`
    pub fn catalogs() -> Self {
        Self::new("unity-catalog/catalogs")
    }

    /// `unity-catalog/schemas?catalog_name=…`
    pub fn schemas(catalog: &str) -> Self {
        Self::new("unity-catalog/schemas").with_query("catalog_name", catalog)
    }

    /// `unity-catalog/tables?catalog_name=…&schema_name=…`
    pub fn tables(catalog: &str, schema: &str) -> Self {
        Self::new("unity-catalog/tables")
            .with_query("catalog_name", catalog)
            .with_query("schema_name", schema)
    }

    /// `unity-catalog/tables/{full_name}`
    pub fn table(full_name: &str) -> Self {
        Self::new(format!(
            "unity-catalog/tables/{}",
            urlencoding::encode(full_name)
        ))
    }

    /// `jobs/list`
    pub fn jobs() -> Self {
        Self::new("jobs/list")
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(&'static str, String)] {
        &self.query
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

/// Retry parameters for rate-limited responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_retries: u32,
    /// Delay after the first rate-limited attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay waited after the `k`-th rate-limited attempt: `base * 2^(k-1)`.
    pub fn delay_after(&self, k: u32) -> Duration {
        let factor = 1u32.checked_shl(k.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(500))
    }
}

impl From<&HarvestConfig> for RetryPolicy {
    fn from(config: &HarvestConfig) -> Self {
        Self::new(config.max_retries, config.base_delay)
    }
}

/// Attempt counter for one fetch, paced by a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryState {
    attempts: u32,
    policy: RetryPolicy,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempts: 0,
            policy: *policy,
        }
    }

    /// Record the start of an attempt and return its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Record a rate-limited attempt.
    ///
    /// Returns the delay to wait before the next attempt, or `None` once the
    /// attempt budget is spent.
    pub fn backoff(&self) -> Option<Duration> {
        if self.attempts >= self.policy.max_retries {
            return None;
        }
        Some(self.policy.delay_after(self.attempts))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Session-scoped fetcher: HTTP client, concurrency gate and retry policy.
pub struct BackoffFetcher {
    http: reqwest::Client,
    api_root: String,
    gate: ConcurrencyGate,
    retry: RetryPolicy,
}

impl fmt::Debug for BackoffFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffFetcher")
            .field("api_root", &self.api_root)
            .field("gate", &self.gate)
            .field("retry", &self.retry)
            .finish()
    }
}

impl BackoffFetcher {
    /// Open a session for one run.
    pub fn new(config: &HarvestConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("ucharvest")),
        );

        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ClientError::Config("Invalid token format".to_string()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            api_root: config.api_root(),
            gate: ConcurrencyGate::new(config.max_concurrent_requests),
            retry: RetryPolicy::from(config),
        })
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// GET an endpoint and deserialize its JSON body.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T> {
        let value = self.fetch(endpoint).await?;
        serde_json::from_value(value).map_err(|e| {
            ClientError::InvalidResponse(format!("Unexpected body from {}: {}", endpoint, e))
        })
    }

    /// GET an endpoint, retrying on 429 with exponential backoff.
    ///
    /// Any other non-success status fails immediately.
    pub async fn fetch(&self, endpoint: &Endpoint) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.api_root, endpoint.path());
        let mut state = RetryState::new(&self.retry);

        loop {
            let attempt = state.begin_attempt();
            let error = match self.attempt(&url, endpoint, attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            match state.backoff() {
                Some(delay) => {
                    tracing::warn!(
                        endpoint = %endpoint,
                        attempt,
                        delay_ms = %delay.as_millis(),
                        error = %error,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    tracing::warn!(
                        endpoint = %endpoint,
                        attempts = state.attempts(),
                        "Retry budget exhausted"
                    );
                    return Err(ClientError::MaxRetriesExceeded {
                        endpoint: endpoint.to_string(),
                        attempts: state.attempts(),
                    });
                }
            }
        }
    }

    /// One gated round trip. The permit is released when this returns.
    async fn attempt(
        &self,
        url: &str,
        endpoint: &Endpoint,
        attempt: u32,
    ) -> Result<serde_json::Value> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| ClientError::Config("concurrency gate closed".to_string()))?;
        let start = Instant::now();

        tracing::debug!(endpoint = %endpoint, attempt, "Sending request");

        let mut request = self.http.get(url);
        if !endpoint.query().is_empty() {
            request = request.query(endpoint.query());
        }
        let response = request.send().await?;
        let status = response.status();

        let body = response.bytes().await?;
        let duration = start.elapsed();

        tracing::debug!(
            endpoint = %endpoint,
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "Received response"
        );

        if !status.is_success() {
            let message = if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string()
            } else {
                String::from_utf8_lossy(&body).to_string()
            };

            tracing::warn!(
                endpoint = %endpoint,
                status = %status.as_u16(),
                duration_ms = %duration.as_millis(),
                error = %message,
                "Request failed"
            );

            return Err(ClientError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            ClientError::InvalidResponse(format!(
                "Failed to parse response from {}: {} (body: {})",
                endpoint,
                e,
                String::from_utf8_lossy(&body)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::catalogs().to_string(), "unity-catalog/catalogs");
        assert_eq!(
            Endpoint::tables("main", "sales").to_string(),
            "unity-catalog/tables?catalog_name=main&schema_name=sales"
        );
        assert_eq!(Endpoint::jobs().to_string(), "jobs/list");
    }

    #[test]
    fn test_table_endpoint_encodes_name() {
        assert_eq!(
            Endpoint::table("main.sales.orders").path(),
            "unity-catalog/tables/main.sales.orders"
        );
        assert_eq!(
            Endpoint::table("main.sales.my orders").path(),
            "unity-catalog/tables/main.sales.my%20orders"
        );
    }

    #[test]
    fn test_delay_schedule_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500));
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(4), Duration::from_millis(4000));
    }

    #[test]
    fn test_retry_state_follows_policy() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500));
        let mut state = RetryState::new(&policy);
        let mut delays = Vec::new();

        loop {
            let attempt = state.begin_attempt();
            match state.backoff() {
                Some(delay) => {
                    assert_eq!(delay, policy.delay_after(attempt));
                    delays.push(delay);
                }
                None => break,
            }
        }

        assert_eq!(state.attempts(), 5);
        assert_eq!(delays.len(), 4);
    }

    #[test]
    fn test_delay_saturates_for_large_attempt_counts() {
        let policy = RetryPolicy::new(u32::MAX, Duration::from_millis(500));
        assert_eq!(
            policy.delay_after(40),
            Duration::from_millis(500).saturating_mul(u32::MAX)
        );
    }

    #[test]
    fn test_single_attempt_budget_never_sleeps() {
        let policy = RetryPolicy::new(1, Duration::from_millis(500));
        let mut state = RetryState::new(&policy);
        state.begin_attempt();
        assert_eq!(state.backoff(), None);
    }

    #[test]
    fn test_fetcher_rejects_invalid_config() {
        let config = HarvestConfig {
            host: "https://adb-1.example.net".to_string(),
            token: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            BackoffFetcher::new(&config),
            Err(ClientError::Config(_))
        ));
    }
}
