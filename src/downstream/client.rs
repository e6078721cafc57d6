//! HTTP client for the supply chain service.
//!
//! # Responsibilities
//! - Map product operations onto GET/POST/DELETE against the resource URL
//! - Retry reads, guard the listing with the circuit breaker and a fallback
//! - Turn transport, encoding and status failures into `IntegrationError`

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::catalog::product::{Fetched, NewProduct, Product, ProductCollection};
use crate::config::AppConfig;
use crate::downstream::SupplyChain;
use crate::error::{CatalogError, CatalogResult, IntegrationError};
use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, CircuitBreakerError, RetryPolicy};

/// Production `SupplyChain` backed by reqwest.
pub struct SupplyChainClient {
    http: reqwest::Client,
    resource_url: Url,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    /// Last listing that came back fresh; served while the breaker is open.
    last_listing: ArcSwapOption<ProductCollection>,
}

impl SupplyChainClient {
    /// Build a client with its own reqwest instance and request timeout.
    pub fn from_config(config: &AppConfig) -> Result<Self, IntegrationError> {
        let http = reqwest::Client::builder()
            .timeout(config.supply_chain.request_timeout())
            .build()
            .map_err(|e| IntegrationError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Self::with_http_client(config, http)
    }

    /// Build a client around an existing reqwest instance.
    pub fn with_http_client(
        config: &AppConfig,
        http: reqwest::Client,
    ) -> Result<Self, IntegrationError> {
        let target = config.supply_chain.resource_url();
        let resource_url = Url::parse(&target)
            .map_err(|e| IntegrationError::InvalidTarget(format!("{}: {}", target, e)))?;
        if resource_url.cannot_be_a_base() {
            return Err(IntegrationError::InvalidTarget(target));
        }

        info!(url = %resource_url, "Supply chain client initialized");

        Ok(Self {
            http,
            resource_url,
            breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
            retry: RetryPolicy::from_config(&config.retry),
            last_listing: ArcSwapOption::empty(),
        })
    }

    /// The breaker guarding `list`.
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn resource_url(&self) -> &Url {
        &self.resource_url
    }

    fn item_url(&self, id: &str) -> Result<Url, IntegrationError> {
        if id.is_empty() {
            return Err(IntegrationError::InvalidTarget("empty product id".to_string()));
        }
        // Dot segments would be dropped by the URL path normaliser.
        if id == "." || id == ".." {
            return Err(IntegrationError::InvalidTarget(format!("product id '{}'", id)));
        }
        let mut url = self.resource_url.clone();
        url.path_segments_mut()
            .map_err(|_| IntegrationError::InvalidTarget(self.resource_url.to_string()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    /// Send a request and buffer the response.
    async fn exchange(
        &self,
        method: &'static str,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Vec<u8>), IntegrationError> {
        let result = async {
            let response = request
                .send()
                .await
                .map_err(|e| IntegrationError::Transport(e.to_string()))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| IntegrationError::Transport(e.to_string()))?;
            Ok::<_, IntegrationError>((status, body.to_vec()))
        }
        .await;

        let success = matches!(&result, Ok((status, _)) if status.is_success());
        metrics::record_downstream_request(method, success);
        result
    }

    /// Retried GET. `Ok(None)` on 404, error on any other non-success status.
    async fn get(&self, url: &Url) -> Result<Option<Vec<u8>>, IntegrationError> {
        self.retry
            .execute(|| async {
                let (status, body) = self.exchange("GET", self.http.get(url.clone())).await?;
                match status {
                    StatusCode::NOT_FOUND => Ok(None),
                    status if status.is_success() => Ok(Some(body)),
                    status => Err(unexpected_status("GET", url, status)),
                }
            })
            .await
    }

    /// Single POST of a JSON body, decoding a JSON product back.
    async fn post(&self, url: Url, payload: &impl Serialize) -> Result<Product, IntegrationError> {
        let request = self
            .http
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(encode(payload)?);

        let (status, body) = self.exchange("POST", request).await?;
        if !status.is_success() {
            return Err(unexpected_status("POST", &url, status));
        }
        decode(&body)
    }

    async fn ensure_exists(&self, id: &str) -> CatalogResult<()> {
        if let Err(e) = self.read(id).await {
            warn!(id, error = %e, "Existence check against supply chain failed");
            return Err(CatalogError::not_found(id));
        }
        Ok(())
    }

    fn fallback_listing(&self) -> ProductCollection {
        metrics::record_list_degraded();
        match self.last_listing.load_full() {
            Some(listing) => {
                warn!(
                    count = listing.len(),
                    "Serving last known supply chain listing"
                );
                listing.as_ref().clone()
            }
            None => {
                warn!("No earlier supply chain listing, serving empty collection");
                ProductCollection::default()
            }
        }
    }
}

#[async_trait]
impl SupplyChain for SupplyChainClient {
    async fn create(&self, product: &NewProduct) -> CatalogResult<Product> {
        info!(name = %product.name, "Creating product on supply chain");
        Ok(self.post(self.resource_url.clone(), product).await?)
    }

    async fn read(&self, id: &str) -> CatalogResult<Product> {
        info!(id, "Getting product from supply chain");
        let url = self.item_url(id)?;
        match self.get(&url).await? {
            Some(body) if !is_blank(&body) => Ok(decode(&body)?),
            _ => Err(CatalogError::not_found(id)),
        }
    }

    async fn update(&self, id: &str, product: &NewProduct) -> CatalogResult<Product> {
        info!(id, name = %product.name, "Updating product on supply chain");
        self.ensure_exists(id).await?;

        let url = self.item_url(id)?;
        let record = product.clone().with_id(id);
        Ok(self.post(url, &record).await?)
    }

    async fn delete(&self, id: &str) -> CatalogResult<()> {
        info!(id, "Deleting product from supply chain");
        self.ensure_exists(id).await?;

        let url = self.item_url(id)?;
        let (status, _) = self.exchange("DELETE", self.http.delete(url.clone())).await?;
        match status {
            StatusCode::NOT_FOUND => Err(CatalogError::not_found(id)),
            status if status.is_success() => Ok(()),
            status => Err(unexpected_status("DELETE", &url, status).into()),
        }
    }

    async fn list(&self) -> CatalogResult<Fetched<ProductCollection>> {
        info!("Getting all products from supply chain");
        let url = &self.resource_url;
        let result = self
            .breaker
            .call(|| async {
                match self.get(url).await? {
                    Some(body) => decode::<ProductCollection>(&body),
                    None => Err(unexpected_status("GET", url, StatusCode::NOT_FOUND)),
                }
            })
            .await;

        match result {
            Ok(listing) => {
                self.last_listing.store(Some(Arc::new(listing.clone())));
                Ok(Fetched::Fresh(listing))
            }
            Err(CircuitBreakerError::CallNotPermitted { .. }) => {
                Ok(Fetched::Degraded(self.fallback_listing()))
            }
            Err(CircuitBreakerError::Operation(e)) => {
                warn!(error = %e, "Supply chain listing failed, serving fallback");
                Ok(Fetched::Degraded(self.fallback_listing()))
            }
        }
    }
}

fn unexpected_status(method: &str, url: &Url, status: StatusCode) -> IntegrationError {
    IntegrationError::Transport(format!("{} {} returned {}", method, url, status))
}

fn encode(payload: &impl Serialize) -> Result<Vec<u8>, IntegrationError> {
    serde_json::to_vec(payload).map_err(|e| IntegrationError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, IntegrationError> {
    serde_json::from_slice(body).map_err(|e| IntegrationError::Decode(e.to_string()))
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}
