//! Product catalogue.
//!
//! # Data Flow
//! ```text
//! caller (downstream flag)
//!     → service.rs (routing, existence checks, error normalisation)
//!     → store.rs (local)  |  downstream::SupplyChain (remote)
//! ```

pub mod product;
pub mod service;
pub mod store;

pub use product::{Fetched, NewProduct, Product, ProductCollection};
pub use service::ProductService;
pub use store::{MemoryStore, ProductStore};
