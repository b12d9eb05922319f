//! Response types for the catalog API.
//!
//! List responses only declare the fields the harvester reads; everything
//! else in the upstream payload is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Creator identity of catalogs provisioned by the platform itself.
pub const SYSTEM_CATALOG_OWNER: &str = "System user";

/// Schema present in every catalog that only exposes catalog metadata.
pub const METADATA_SCHEMA: &str = "information_schema";

/// Catalog entry from `unity-catalog/catalogs`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogInfo {
    /// Catalog name
    pub name: String,
    /// Principal that created the catalog
    pub created_by: Option<String>,
}

impl CatalogInfo {
    /// Whether the catalog was created by the platform rather than a user.
    pub fn is_system(&self) -> bool {
        self.created_by.as_deref() == Some(SYSTEM_CATALOG_OWNER)
    }
}

/// List catalogs response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListCatalogsResponse {
    /// Catalogs (absent when the workspace has none)
    #[serde(default)]
    pub catalogs: Vec<CatalogInfo>,
}

/// Schema entry from `unity-catalog/schemas`.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaInfo {
    /// Schema name
    pub name: String,
}

/// List schemas response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListSchemasResponse {
    #[serde(default)]
    pub schemas: Vec<SchemaInfo>,
}

/// Table entry from `unity-catalog/tables`.
#[derive(Debug, Clone, Deserialize)]
pub struct TableInfo {
    /// Table name (unqualified)
    pub name: String,
}

/// List tables response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListTablesResponse {
    #[serde(default)]
    pub tables: Vec<TableInfo>,
}

/// List jobs response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListJobsResponse {
    /// Raw job records
    #[serde(default)]
    pub jobs: Vec<serde_json::Value>,
}

/// Canonical projection of a table's detail record.
///
/// Deserializing a raw record into this type discards every field except
/// the four listed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDetail {
    /// Table name (unqualified)
    pub name: String,
    /// Parent catalog
    pub catalog_name: String,
    /// Parent schema
    pub schema_name: String,
    /// Columns in declaration order
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

/// Canonical projection of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Declared type as written in DDL (e.g. `decimal(10,2)`)
    pub type_text: String,
}
