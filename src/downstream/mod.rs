//! Supply chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! ProductService (downstream = true)
//!     → SupplyChain trait
//!     → client.rs (SupplyChainClient)
//!         read/list: RetryPolicy around GET
//!         list:      CircuitBreaker around the retried GET, fallback on rejection or failure
//!         update/delete: read-based existence check, then a single write
//! ```
//!
//! # Design Decisions
//! - Only `list` is breaker-protected; writes are sent once
//! - A rejected or failed listing yields `Fetched::Degraded`, never an error
//! - The fallback is the last successful listing, or empty

pub mod client;

use async_trait::async_trait;

use crate::catalog::product::{Fetched, NewProduct, Product, ProductCollection};
use crate::error::CatalogResult;

pub use client::SupplyChainClient;

/// Remote product operations.
#[async_trait]
pub trait SupplyChain: Send + Sync {
    /// Create a product; the remote service assigns the id.
    async fn create(&self, product: &NewProduct) -> CatalogResult<Product>;

    /// Fetch one product. Absence is `CatalogError::NotFound`.
    async fn read(&self, id: &str) -> CatalogResult<Product>;

    /// Replace a product. `NotFound` without any write if `read(id)` fails.
    async fn update(&self, id: &str, product: &NewProduct) -> CatalogResult<Product>;

    /// Remove a product. `NotFound` without any write if `read(id)` fails.
    async fn delete(&self, id: &str) -> CatalogResult<()>;

    /// All products. Substitute data is tagged `Fetched::Degraded`.
    async fn list(&self) -> CatalogResult<Fetched<ProductCollection>>;
}
