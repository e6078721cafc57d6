//! Error taxonomy shared by the local and downstream paths.
//!
//! # Design Decisions
//! - Callers of the product service only ever see `CatalogError`
//! - Downstream failures collapse into `IntegrationError`, carrying a message
//! - Store failures are reduced to a message before leaving the service

use thiserror::Error;

/// Errors returned by the product service and the supply chain integration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The product id does not exist.
    #[error("Product with id {id} wasn't found")]
    NotFound { id: String },

    /// The supply chain could not be reached or answered with garbage.
    #[error("Supply chain integration failed: {0}")]
    Integration(#[from] IntegrationError),

    /// A local operation failed.
    #[error("{0}")]
    Operation(String),
}

impl CatalogError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Return true for the `NotFound` kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}

/// Failures talking to the supply chain service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrationError {
    /// The target URL could not be built.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Connection, timeout or unexpected status.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request body could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// The response body could not be deserialized.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Errors raised by a product store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
