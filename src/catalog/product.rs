//! Product records and their wire shape.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalogue entry. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

/// Caller-supplied fields for create and full-record update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl NewProduct {
    /// Attach an identity, producing the stored record.
    pub fn with_id(self, id: impl Into<String>) -> Product {
        Product {
            id: id.into(),
            name: self.name,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// Ordered list of products, `{"bundle": [...]}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductCollection {
    #[serde(default)]
    pub bundle: Vec<Product>,
}

impl ProductCollection {
    pub fn new(bundle: Vec<Product>) -> Self {
        Self { bundle }
    }

    pub fn len(&self) -> usize {
        self.bundle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundle.is_empty()
    }
}

impl From<Vec<Product>> for ProductCollection {
    fn from(bundle: Vec<Product>) -> Self {
        Self::new(bundle)
    }
}

/// Result of a read that may have been served from a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// Real data from the source of truth.
    Fresh(T),
    /// Substitute data; the source could not be asked.
    Degraded(T),
}

impl<T> Fetched<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Fetched::Fresh(value) | Fetched::Degraded(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Fetched::Fresh(value) | Fetched::Degraded(value) => value,
        }
    }
}
