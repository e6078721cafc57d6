//! Dual-path product service.
//!
//! Every operation takes a `downstream` flag. `true` hands the call to the
//! supply chain as-is; `false` serves it from the local store with the same
//! existence semantics (update of a missing id is `NotFound`, delete of a
//! missing id is a no-op).

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::catalog::product::{Fetched, NewProduct, Product, ProductCollection};
use crate::catalog::store::ProductStore;
use crate::downstream::SupplyChain;
use crate::error::{CatalogError, CatalogResult, StoreError};

/// Single entry point for product operations.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    supply_chain: Arc<dyn SupplyChain>,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>, supply_chain: Arc<dyn SupplyChain>) -> Self {
        Self {
            store,
            supply_chain,
        }
    }

    pub async fn create(&self, product: NewProduct, downstream: bool) -> CatalogResult<Product> {
        if downstream {
            return self.supply_chain.create(&product).await;
        }

        let name = product.name.clone();
        let record = product.with_id(Uuid::new_v4().to_string());
        let saved = self
            .store
            .save(record)
            .await
            .map_err(|e| operation_error(format!("Error saving product {}", name), e))?;

        info!(id = %saved.id, name = %saved.name, "Product saved");
        Ok(saved)
    }

    /// `Ok(None)` when a local lookup finds nothing.
    pub async fn read(&self, id: &str, downstream: bool) -> CatalogResult<Option<Product>> {
        if downstream {
            return self.supply_chain.read(id).await.map(Some);
        }

        self.store
            .find(id)
            .await
            .map_err(|e| operation_error(format!("Error getting productId {}", id), e))
    }

    pub async fn update(
        &self,
        id: &str,
        product: NewProduct,
        downstream: bool,
    ) -> CatalogResult<Product> {
        if downstream {
            return self.supply_chain.update(id, &product).await;
        }

        let existing = self
            .store
            .find(id)
            .await
            .map_err(|e| operation_error(format!("Error updating productId {}", id), e))?;
        if existing.is_none() {
            info!(id, "Update skipped, product not found");
            return Err(CatalogError::not_found(id));
        }

        let saved = self
            .store
            .save(product.with_id(id))
            .await
            .map_err(|e| operation_error(format!("Error updating productId {}", id), e))?;

        info!(id, "Product updated");
        Ok(saved)
    }

    /// Deleting an id that does not exist locally succeeds without effect.
    pub async fn delete(&self, id: &str, downstream: bool) -> CatalogResult<()> {
        if downstream {
            return self.supply_chain.delete(id).await;
        }

        let context = || format!("Error deleting productId {}", id);
        let existing = self
            .store
            .find(id)
            .await
            .map_err(|e| operation_error(context(), e))?;

        match existing {
            Some(product) => {
                self.store
                    .delete(&product)
                    .await
                    .map_err(|e| operation_error(context(), e))?;
                info!(id, "Product deleted");
            }
            None => info!(id, "Delete of unknown product ignored"),
        }
        Ok(())
    }

    /// Local listings are always `Fresh`; only the supply chain can degrade.
    pub async fn list(&self, downstream: bool) -> CatalogResult<Fetched<ProductCollection>> {
        if downstream {
            return self.supply_chain.list().await;
        }

        let products = self
            .store
            .find_all()
            .await
            .map_err(|e| operation_error("Error getting products".to_string(), e))?;

        Ok(Fetched::Fresh(ProductCollection::new(products)))
    }
}

/// Log the store failure and reduce it to a message.
fn operation_error(message: String, cause: StoreError) -> CatalogError {
    error!(error = %cause, "{}", message);
    CatalogError::Operation(message)
}
