//! Top-level harvesting operations.

use crate::config::HarvestConfig;
use crate::details::TableDetailFetcher;
use crate::envelope::ToolResponse;
use crate::error::Result;
use crate::fetcher::BackoffFetcher;
use crate::jobs;
use crate::tree::CatalogTree;
use crate::types::TableDetail;
use crate::walker::CatalogWalker;
use std::time::Instant;

/// Entry point for harvesting catalog metadata.
///
/// The harvester only holds configuration. Each operation opens its own
/// session (HTTP client and concurrency gate) and drops it before returning,
/// so nothing is shared between runs.
#[derive(Debug, Clone)]
pub struct Harvester {
    config: HarvestConfig,
}

impl Harvester {
    /// Create a harvester with the given configuration.
    pub fn new(config: HarvestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    fn open_session(&self) -> Result<BackoffFetcher> {
        BackoffFetcher::new(&self.config)
    }

    // =========================================================================
    // Operations returning structured errors
    // =========================================================================

    /// Discover every catalog, schema and table in the workspace.
    pub async fn discover_all(&self) -> Result<CatalogTree> {
        let session = self.open_session()?;
        let start = Instant::now();
        let tree = CatalogWalker::new(&session).discover_all().await?;
        tracing::debug!(
            duration_ms = %start.elapsed().as_millis(),
            "Discovery finished"
        );
        Ok(tree)
    }

    /// Fetch projected details for fully qualified table names.
    pub async fn table_details<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<TableDetail>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let session = self.open_session()?;
        TableDetailFetcher::new(&session).fetch_details(names).await
    }

    /// List jobs defined in the workspace.
    pub async fn list_jobs(&self) -> Result<Vec<serde_json::Value>> {
        let session = self.open_session()?;
        jobs::list_jobs(&session).await
    }

    // =========================================================================
    // Enveloped operations
    // =========================================================================

    /// "Discover all tables", wrapped in a [`ToolResponse`].
    pub async fn discover_all_tables(&self) -> ToolResponse<CatalogTree> {
        ToolResponse::from_result(self.discover_all().await)
    }

    /// "Get table details", wrapped in a [`ToolResponse`].
    pub async fn get_table_details<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> ToolResponse<Vec<TableDetail>> {
        ToolResponse::from_result(self.table_details(names).await)
    }

    /// "List jobs", wrapped in a [`ToolResponse`].
    pub async fn get_jobs(&self) -> ToolResponse<Vec<serde_json::Value>> {
        ToolResponse::from_result(self.list_jobs().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_config() {
        let config = HarvestConfig {
            host: "https://adb-1.example.net".to_string(),
            token: "t".to_string(),
            max_concurrent_requests: 0,
            ..Default::default()
        };
        assert!(Harvester::new(config).is_err());
    }

    #[test]
    fn test_new_rejects_oversized_gate() {
        let config = HarvestConfig {
            host: "https://adb-1.example.net".to_string(),
            token: "t".to_string(),
            max_concurrent_requests: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(
            Harvester::new(config),
            Err(crate::error::ClientError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_detail_request_opens_no_session() {
        // Unroutable host: any request would fail
        let config = HarvestConfig::builder("http://127.0.0.1:9", "t")
            .build()
            .unwrap();
        let harvester = Harvester::new(config).unwrap();

        let response = harvester.get_table_details::<String>(&[]).await;
        assert!(response.success);
        assert_eq!(response.content, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_malformed_name_fails_before_network() {
        let config = HarvestConfig::builder("http://127.0.0.1:9", "t")
            .build()
            .unwrap();
        let harvester = Harvester::new(config).unwrap();

        let response = harvester.get_table_details(&["main.orders"]).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("main.orders"));
    }
}
