//! Workspace job listing.

use crate::error::Result;
use crate::fetcher::{BackoffFetcher, Endpoint};
use crate::types::ListJobsResponse;

/// Raw job records from `jobs/list`. An absent `jobs` key means no jobs.
pub async fn list_jobs(fetcher: &BackoffFetcher) -> Result<Vec<serde_json::Value>> {
    let response: ListJobsResponse = fetcher.get(&Endpoint::jobs()).await?;
    tracing::info!(jobs = response.jobs.len(), "Listed jobs");
    Ok(response.jobs)
}
