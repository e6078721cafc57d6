//! Local product persistence.
//!
//! `ProductStore` is the seam the service talks to; `MemoryStore` is the
//! bundled implementation, a concurrent map that can be snapshotted to a
//! JSON file between runs.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::catalog::product::Product;
use crate::error::StoreError;

/// Persistence operations the product service relies on.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<Product>, StoreError>;
    async fn save(&self, product: Product) -> Result<Product, StoreError>;
    async fn delete(&self, product: &Product) -> Result<(), StoreError>;
    async fn find_all(&self) -> Result<Vec<Product>, StoreError>;
}

/// Thread-safe in-memory store with optional file persistence.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, Product>>,
    persistence_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path` if it exists; later `persist` calls write back to it.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self {
            inner: Arc::new(DashMap::new()),
            persistence_path: Some(path.to_path_buf()),
        };

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let products: Vec<Product> = serde_json::from_reader(reader)?;
            for product in products {
                store.inner.insert(product.id.clone(), product);
            }
            tracing::info!(path = %path.display(), count = store.inner.len(), "Loaded products from store file");
        }
        Ok(store)
    }

    /// Write the current contents to the persistence file, if any.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };

        let mut products: Vec<Product> = self.inner.iter().map(|r| r.value().clone()).collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));

        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &products)?;
        tracing::debug!(path = %path.display(), count = products.len(), "Saved products to store file");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.inner.get(id).map(|r| r.value().clone()))
    }

    async fn save(&self, product: Product) -> Result<Product, StoreError> {
        self.inner.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    async fn delete(&self, product: &Product) -> Result<(), StoreError> {
        self.inner.remove(&product.id);
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.inner.iter().map(|r| r.value().clone()).collect())
    }
}
