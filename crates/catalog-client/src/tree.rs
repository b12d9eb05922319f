//! Qualified table references and the nested discovery result.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Separator between the parts of a qualified table name.
pub const SEPARATOR: char = '.';

/// Three-part identity of a table: `catalog.schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableRef {
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Parse a qualified name.
    ///
    /// Exactly three non-empty parts are required; anything else is rejected
    /// rather than guessed at.
    pub fn parse(qualified: &str) -> Result<Self> {
        let parts: Vec<&str> = qualified.split(SEPARATOR).collect();
        match parts.as_slice() {
            [catalog, schema, table]
                if !catalog.is_empty() && !schema.is_empty() && !table.is_empty() =>
            {
                Ok(Self::new(*catalog, *schema, *table))
            }
            _ => Err(ClientError::InvalidTableName(qualified.to_string())),
        }
    }

    /// Join the parts back into `catalog.schema.table`.
    pub fn qualified_name(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.catalog,
            self.schema,
            self.table,
            sep = SEPARATOR
        )
    }

    /// Whether joining and re-parsing reproduces this reference exactly.
    pub fn is_separator_safe(&self) -> bool {
        [&self.catalog, &self.schema, &self.table]
            .iter()
            .all(|part| !part.contains(SEPARATOR))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Discovered tables: catalog → schema → table names.
///
/// Keys are kept sorted so two discoveries of the same upstream state
/// serialize identically. Table order within a schema follows the order the
/// upstream listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogTree {
    catalogs: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl CatalogTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalog, even if it ends up with no schemas.
    pub fn add_catalog(&mut self, catalog: &str) {
        self.catalogs.entry(catalog.to_string()).or_default();
    }

    /// Register a schema, even if it ends up with no tables.
    pub fn add_schema(&mut self, catalog: &str, schema: &str) {
        self.catalogs
            .entry(catalog.to_string())
            .or_default()
            .entry(schema.to_string())
            .or_default();
    }

    /// Insert a table, creating intermediate entries on first use.
    ///
    /// Inserting the same reference twice leaves a single entry. The check
    /// scans the schema's list; bulk loads should dedupe up front and use
    /// [`CatalogTree::append`].
    pub fn insert(&mut self, table: &TableRef) {
        let tables = self.schema_tables(table);
        if !tables.iter().any(|t| t == &table.table) {
            tables.push(table.table.clone());
        }
    }

    /// Append a table without checking for an existing entry.
    pub fn append(&mut self, table: &TableRef) {
        self.schema_tables(table).push(table.table.clone());
    }

    fn schema_tables(&mut self, table: &TableRef) -> &mut Vec<String> {
        self.catalogs
            .entry(table.catalog.clone())
            .or_default()
            .entry(table.schema.clone())
            .or_default()
    }

    pub fn catalog_names(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }

    pub fn schemas(&self, catalog: &str) -> Option<&BTreeMap<String, Vec<String>>> {
        self.catalogs.get(catalog)
    }

    pub fn tables(&self, catalog: &str, schema: &str) -> Option<&[String]> {
        self.catalogs
            .get(catalog)
            .and_then(|schemas| schemas.get(schema))
            .map(Vec::as_slice)
    }

    /// All table references, in catalog/schema key order.
    pub fn table_refs(&self) -> impl Iterator<Item = TableRef> + '_ {
        self.catalogs.iter().flat_map(|(catalog, schemas)| {
            schemas.iter().flat_map(move |(schema, tables)| {
                tables
                    .iter()
                    .map(move |table| TableRef::new(catalog, schema, table))
            })
        })
    }

    pub fn table_count(&self) -> usize {
        self.catalogs
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogs.is_empty()
    }

    /// Equality that ignores table order within each schema.
    pub fn same_structure(&self, other: &CatalogTree) -> bool {
        fn normalized(tree: &CatalogTree) -> BTreeMap<&str, BTreeMap<&str, Vec<&str>>> {
            tree.catalogs
                .iter()
                .map(|(catalog, schemas)| {
                    let schemas = schemas
                        .iter()
                        .map(|(schema, tables)| {
                            let mut tables: Vec<&str> =
                                tables.iter().map(String::as_str).collect();
                            tables.sort_unstable();
                            (schema.as_str(), tables)
                        })
                        .collect();
                    (catalog.as_str(), schemas)
                })
                .collect()
        }
        normalized(self) == normalized(other)
    }
}
