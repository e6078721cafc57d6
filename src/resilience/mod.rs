//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Downstream list:
//!     → circuit_breaker.rs (fail fast while open, count outcomes)
//!     → retries.rs (re-run the GET with a fixed wait)
//!     → transport
//! ```
//!
//! # Design Decisions
//! - Breaker and retry policy are plain objects owned by the client that uses them
//! - The breaker sees one outcome per retried call, not one per attempt
//! - Only idempotent reads are retried

pub mod circuit_breaker;
pub mod retries;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerError, CircuitState};
pub use retries::RetryPolicy;
