//! Unity Catalog metadata harvester
//!
//! A concurrent client that walks a catalog REST API
//! (catalog → schema → table) and fetches table-level column metadata.
//!
//! # Features
//!
//! - **Fan-out discovery**: each level of the hierarchy is fetched in parallel
//!   once the level above it is complete
//! - **Concurrency gate**: one bounded permit pool caps in-flight requests for
//!   a whole run (default 8)
//! - **Rate-limit backoff**: HTTP 429 is retried with exponential delay
//!   (default 5 attempts, 500ms base); every other failure is terminal
//! - **Uniform envelope**: top-level operations can return a
//!   `{success, content | error}` shape for tool-serving layers
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ucharvest_client::{HarvestConfig, Harvester};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // DATABRICKS_HOST and DATABRICKS_TOKEN must be set
//!     let config = HarvestConfig::from_env()?
//!         .max_concurrent_requests(4)
//!         .build()?;
//!     let harvester = Harvester::new(config)?;
//!
//!     let tree = harvester.discover_all().await?;
//!     for catalog in tree.catalog_names() {
//!         println!("{catalog}");
//!     }
//!
//!     let details = harvester.table_details(&["main.sales.orders"]).await?;
//!     println!("{} columns", details[0].columns.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Operations returning `Result<T, ClientError>` keep the structured error:
//!
//! - `Status`: non-success HTTP status other than 429 (e.g. 404 for a
//!   missing table)
//! - `MaxRetriesExceeded`: every attempt was rate limited
//! - `InvalidTableName`: a qualified name is not `catalog.schema.table`
//! - `Config`: missing credentials or invalid settings
//!
//! The enveloped variants (`discover_all_tables`, `get_table_details`,
//! `get_jobs`) flatten the error to its display text.

pub mod client;
pub mod config;
pub mod details;
pub mod envelope;
pub mod error;
mod fanout;
pub mod fetcher;
pub mod gate;
pub mod jobs;
pub mod tree;
pub mod types;
pub mod walker;

// Re-exports for convenience
pub use client::Harvester;
pub use config::{HarvestConfig, HarvestConfigBuilder};
pub use details::TableDetailFetcher;
pub use envelope::ToolResponse;
pub use error::{ClientError, Result};
pub use fetcher::{BackoffFetcher, Endpoint, RetryPolicy, RetryState};
pub use gate::ConcurrencyGate;
pub use tree::{CatalogTree, TableRef};
pub use types::{ColumnInfo, TableDetail};
pub use walker::CatalogWalker;
