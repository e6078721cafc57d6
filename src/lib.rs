//! Product catalogue gateway with a resilient supply chain integration.

pub mod catalog;
pub mod config;
pub mod downstream;
pub mod error;
pub mod observability;
pub mod resilience;

pub use catalog::{Fetched, MemoryStore, NewProduct, Product, ProductCollection, ProductService, ProductStore};
pub use config::AppConfig;
pub use downstream::{SupplyChain, SupplyChainClient};
pub use error::{CatalogError, CatalogResult, IntegrationError, StoreError};
