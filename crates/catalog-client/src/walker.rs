//! Three-level discovery: catalogs, then schemas, then tables.
//!
//! Each level depends on identifiers from the one above it, so levels run as
//! strict barriers. Within a level every request is independent and all of
//! them are issued at once; the shared gate on the fetcher bounds how many
//! are actually in flight.

use crate::error::Result;
use crate::fanout::gather;
use crate::fetcher::{BackoffFetcher, Endpoint};
use crate::tree::{CatalogTree, TableRef};
use crate::types::{ListCatalogsResponse, ListSchemasResponse, ListTablesResponse, METADATA_SCHEMA};
use std::collections::HashSet;

/// Walks the catalog hierarchy through a session's fetcher.
#[derive(Debug, Clone, Copy)]
pub struct CatalogWalker<'a> {
    fetcher: &'a BackoffFetcher,
}

impl<'a> CatalogWalker<'a> {
    pub fn new(fetcher: &'a BackoffFetcher) -> Self {
        Self { fetcher }
    }

    /// User catalogs, in upstream order. System catalogs are skipped.
    pub async fn list_catalogs(&self) -> Result<Vec<String>> {
        let response: ListCatalogsResponse = self.fetcher.get(&Endpoint::catalogs()).await?;
        Ok(response
            .catalogs
            .into_iter()
            .filter(|c| !c.is_system())
            .map(|c| c.name)
            .collect())
    }

    /// Schemas of one catalog, without `information_schema`.
    pub async fn list_schemas(&self, catalog: &str) -> Result<Vec<String>> {
        let response: ListSchemasResponse =
            self.fetcher.get(&Endpoint::schemas(catalog)).await?;
        Ok(response
            .schemas
            .into_iter()
            .map(|s| s.name)
            .filter(|name| name != METADATA_SCHEMA)
            .collect())
    }

    /// Tables of one schema.
    pub async fn list_tables(&self, catalog: &str, schema: &str) -> Result<Vec<TableRef>> {
        let response: ListTablesResponse =
            self.fetcher.get(&Endpoint::tables(catalog, schema)).await?;
        let tables: Vec<TableRef> = response
            .tables
            .into_iter()
            .map(|t| TableRef::new(catalog, schema, t.name))
            .collect();

        for table in tables.iter().filter(|t| !t.is_separator_safe()) {
            tracing::warn!(
                catalog = %table.catalog,
                schema = %table.schema,
                table = %table.table,
                "Name contains '.', its qualified form cannot be looked up"
            );
        }
        Ok(tables)
    }

    /// Discover every table reachable from the user catalogs.
    ///
    /// Any failed fetch fails the whole walk; no partial tree is returned.
    pub async fn discover_all(&self) -> Result<CatalogTree> {
        let catalogs = self.list_catalogs().await?;
        tracing::info!(catalogs = catalogs.len(), "Discovered catalogs");

        let schemas_per_catalog =
            gather(catalogs.iter().map(|catalog| self.list_schemas(catalog))).await?;

        let pairs: Vec<(&str, String)> = catalogs
            .iter()
            .zip(schemas_per_catalog)
            .flat_map(|(catalog, schemas)| {
                schemas
                    .into_iter()
                    .map(move |schema| (catalog.as_str(), schema))
            })
            .collect();
        tracing::info!(schemas = pairs.len(), "Discovered schemas");

        let tables_per_schema = gather(
            pairs
                .iter()
                .map(|(catalog, schema)| self.list_tables(catalog, schema)),
        )
        .await?;

        let mut tree = CatalogTree::new();
        for catalog in &catalogs {
            tree.add_catalog(catalog);
        }
        for (catalog, schema) in &pairs {
            tree.add_schema(catalog, schema);
        }
        let mut seen = HashSet::new();
        for table in tables_per_schema.iter().flatten() {
            if seen.insert(table) {
                tree.append(table);
            }
        }

        tracing::info!(tables = tree.table_count(), "Discovered tables");
        Ok(tree)
    }
}
