//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use catalog_gateway::{
    AppConfig, CatalogError, CatalogResult, Fetched, MemoryStore, NewProduct, Product,
    ProductCollection, ProductStore, StoreError, SupplyChain, SupplyChainClient,
};

/// A request as seen by the mock supply chain.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

pub type RequestLog = Arc<Mutex<Vec<MockRequest>>>;

/// Requests received so far, as "METHOD /path".
pub fn requests(log: &RequestLog) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect()
}

/// Start a programmable mock supply chain on an ephemeral port.
///
/// `handler` maps each request to a status code and JSON body.
pub async fn start_supply_chain<F>(handler: F) -> (SocketAddr, RequestLog)
where
    F: Fn(&MockRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let accept_log = log.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    let log = accept_log.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = handler(&request);
                        log.lock().unwrap().push(request);

                        let status_text = match status {
                            200 => "200 OK",
                            201 => "201 Created",
                            204 => "204 No Content",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, log)
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..end]).to_string();

    Some(MockRequest { method, path, body })
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Config pointing at `addr` with fast retries and a small breaker window.
pub fn gateway_config(addr: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.supply_chain.base_url = format!("http://{}", addr);
    config.supply_chain.resource_path = "/products".into();
    config.supply_chain.request_timeout_secs = 5;
    config.retry.max_attempts = 3;
    config.retry.wait_duration_ms = 10;
    config.circuit_breaker.sliding_window_size = 2;
    config.circuit_breaker.failure_rate_threshold = 50.0;
    config.circuit_breaker.wait_duration_in_open_ms = 60_000;
    config.circuit_breaker.permitted_calls_in_half_open = 1;
    config
}

pub fn client_for(config: &AppConfig) -> SupplyChainClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    SupplyChainClient::with_http_client(config, http).unwrap()
}

pub fn new_product(name: &str, price: &str, quantity: u32) -> NewProduct {
    NewProduct {
        name: name.into(),
        price: price.parse::<Decimal>().unwrap(),
        quantity,
    }
}

pub fn product_json(id: &str, name: &str, price: f64, quantity: u32) -> String {
    serde_json::json!({"id": id, "name": name, "price": price, "quantity": quantity}).to_string()
}

/// Store wrapper counting mutations, optionally failing every call.
#[derive(Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    pub saves: AtomicUsize,
    pub deletes: AtomicUsize,
    failing: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Unavailable("disk on fire".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProductStore for RecordingStore {
    async fn find(&self, id: &str) -> Result<Option<Product>, StoreError> {
        self.check()?;
        self.inner.find(id).await
    }

    async fn save(&self, product: Product) -> Result<Product, StoreError> {
        self.check()?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(product).await
    }

    async fn delete(&self, product: &Product) -> Result<(), StoreError> {
        self.check()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(product).await
    }

    async fn find_all(&self) -> Result<Vec<Product>, StoreError> {
        self.check()?;
        self.inner.find_all().await
    }
}

/// In-process supply chain double with the same existence semantics as the
/// real client.
pub struct FakeSupplyChain {
    products: DashMap<String, Product>,
    degraded: bool,
    next_id: AtomicUsize,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeSupplyChain {
    pub fn new() -> Self {
        Self {
            products: DashMap::new(),
            degraded: false,
            next_id: AtomicUsize::new(1),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A double whose `list` reports a degraded (fallback) listing.
    pub fn degraded() -> Self {
        Self {
            degraded: true,
            ..Self::new()
        }
    }

    pub fn with_product(self, product: Product) -> Self {
        self.products.insert(product.id.clone(), product);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SupplyChain for FakeSupplyChain {
    async fn create(&self, product: &NewProduct) -> CatalogResult<Product> {
        self.record("create");
        let id = format!("remote-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let created = product.clone().with_id(id.clone());
        self.products.insert(id, created.clone());
        Ok(created)
    }

    async fn read(&self, id: &str) -> CatalogResult<Product> {
        self.record("read");
        self.products
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CatalogError::not_found(id))
    }

    async fn update(&self, id: &str, product: &NewProduct) -> CatalogResult<Product> {
        self.record("update");
        if !self.products.contains_key(id) {
            return Err(CatalogError::not_found(id));
        }
        let updated = product.clone().with_id(id);
        self.products.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> CatalogResult<()> {
        self.record("delete");
        self.products
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::not_found(id))
    }

    async fn list(&self) -> CatalogResult<Fetched<ProductCollection>> {
        self.record("list");
        let listing = ProductCollection::new(self.products.iter().map(|r| r.value().clone()).collect());
        if self.degraded {
            Ok(Fetched::Degraded(listing))
        } else {
            Ok(Fetched::Fresh(listing))
        }
    }
}
