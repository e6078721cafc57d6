//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file and
//! every field has a default, so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the catalog gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Remote supply chain endpoint.
    pub supply_chain: SupplyChainConfig,

    /// Circuit breaker guarding the downstream list call.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Retry policy for downstream reads.
    pub retry: RetryConfig,

    /// Local product store.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Supply chain endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SupplyChainConfig {
    /// Base URL of the service (e.g., "http://localhost:8090").
    pub base_url: String,

    /// Resource path appended to the base URL.
    pub resource_path: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl SupplyChainConfig {
    /// Full resource URL, `base_url` followed by `resource_path`.
    pub fn resource_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.resource_path
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SupplyChainConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            resource_path: "/products".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Count-based circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Name used in logs and metric labels.
    pub name: String,

    /// Number of most recent outcomes kept in the sliding window.
    pub sliding_window_size: usize,

    /// Failure percentage at or above which the breaker opens.
    pub failure_rate_threshold: f32,

    /// Time spent open before trial calls are let through, in milliseconds.
    pub wait_duration_in_open_ms: u64,

    /// Number of trial calls allowed while half-open.
    pub permitted_calls_in_half_open: u32,
}

impl CircuitBreakerConfig {
    pub fn wait_duration_in_open(&self) -> Duration {
        Duration::from_millis(self.wait_duration_in_open_ms)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        // 70% failures opens the breaker; after 10 seconds 4 trial calls probe recovery.
        Self {
            name: "supply-chain".to_string(),
            sliding_window_size: 10,
            failure_rate_threshold: 70.0,
            wait_duration_in_open_ms: 10_000,
            permitted_calls_in_half_open: 4,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds.
    pub wait_duration_ms: u64,
}

impl RetryConfig {
    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait_duration_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait_duration_ms: 1_000,
        }
    }
}

/// Local store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// Optional JSON file the in-memory store is loaded from and saved to.
    pub path: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when `RUST_LOG` is not set (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for terminals, JSON for log shippers.
    pub log_format: LogFormat,

    /// Install the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
