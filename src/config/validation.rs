//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window sizes, percentages, attempts)
//! - Check the supply chain target is a usable URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let supply_chain = &config.supply_chain;
    match Url::parse(&supply_chain.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "supply_chain.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "supply_chain.base_url",
            format!("'{}' is not a valid URL: {}", supply_chain.base_url, e),
        )),
    }
    if !supply_chain.resource_path.starts_with('/') {
        errors.push(ValidationError::new(
            "supply_chain.resource_path",
            "must start with '/'",
        ));
    }
    if supply_chain.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "supply_chain.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    let breaker = &config.circuit_breaker;
    if breaker.sliding_window_size == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.sliding_window_size",
            "must be at least 1",
        ));
    }
    if !(breaker.failure_rate_threshold > 0.0 && breaker.failure_rate_threshold <= 100.0) {
        errors.push(ValidationError::new(
            "circuit_breaker.failure_rate_threshold",
            format!(
                "{} is outside (0, 100]",
                breaker.failure_rate_threshold
            ),
        ));
    }
    if breaker.permitted_calls_in_half_open == 0 {
        errors.push(ValidationError::new(
            "circuit_breaker.permitted_calls_in_half_open",
            "must be at least 1",
        ));
    }

    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::new("retry.max_attempts", "must be at least 1"));
    }

    let observability = &config.observability;
    if observability.log_level.parse::<tracing::Level>().is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!(
                "'{}' is not one of trace, debug, info, warn, error",
                observability.log_level
            ),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
