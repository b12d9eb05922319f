//! Parallel table detail fetching with canonical projection.

use crate::error::Result;
use crate::fanout::gather;
use crate::fetcher::{BackoffFetcher, Endpoint};
use crate::tree::TableRef;
use crate::types::TableDetail;

/// Fetches table detail records through a session's fetcher.
#[derive(Debug, Clone, Copy)]
pub struct TableDetailFetcher<'a> {
    fetcher: &'a BackoffFetcher,
}

impl<'a> TableDetailFetcher<'a> {
    pub fn new(fetcher: &'a BackoffFetcher) -> Self {
        Self { fetcher }
    }

    /// Detail of a single table, projected to name, parents and columns.
    pub async fn fetch_one(&self, table: &TableRef) -> Result<TableDetail> {
        self.fetcher
            .get(&Endpoint::table(&table.qualified_name()))
            .await
    }

    /// Details for every qualified name, in the same order as the input.
    ///
    /// Names are validated before any request is sent. A missing table
    /// fails the whole call with the upstream status error.
    pub async fn fetch_details<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<TableDetail>> {
        let tables = names
            .iter()
            .map(|name| TableRef::parse(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let details = gather(tables.iter().map(|table| self.fetch_one(table))).await?;
        tracing::info!(tables = details.len(), "Fetched table details");
        Ok(details)
    }
}
