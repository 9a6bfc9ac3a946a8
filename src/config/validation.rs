//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and URLs actually parse
//! - Validate value ranges (intervals > 0, deadline >= interval)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug)]
pub enum ValidationError {
    InvalidBindAddress(String),
    InvalidUrl { field: &'static str, value: String },
    NonHttpUrl { field: &'static str, value: String },
    ZeroPollInterval,
    DeadlineShorterThanPoll { deadline_ms: u64, poll_interval_ms: u64 },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "listener.bind_address is not a valid socket address: {}", addr)
            }
            ValidationError::InvalidUrl { field, value } => {
                write!(f, "{} is not a valid URL: {}", field, value)
            }
            ValidationError::NonHttpUrl { field, value } => {
                write!(f, "{} must use http or https: {}", field, value)
            }
            ValidationError::ZeroPollInterval => {
                write!(f, "wait.poll_interval_ms must be greater than zero")
            }
            ValidationError::DeadlineShorterThanPoll {
                deadline_ms,
                poll_interval_ms,
            } => write!(
                f,
                "wait.deadline_ms ({}) must be at least wait.poll_interval_ms ({})",
                deadline_ms, poll_interval_ms
            ),
        }
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(_) => errors.push(ValidationError::NonHttpUrl {
            field,
            value: value.to_string(),
        }),
        Err(_) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}

/// Validate a configuration, collecting every semantic error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    check_url("upstream.base_url", &config.upstream.base_url, &mut errors);
    if let Some(webhook_url) = &config.webhook.url {
        check_url("webhook.url", webhook_url, &mut errors);
    }

    if config.wait.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    } else if config.wait.deadline_ms < config.wait.poll_interval_ms {
        errors.push(ValidationError::DeadlineShorterThanPoll {
            deadline_ms: config.wait.deadline_ms,
            poll_interval_ms: config.wait.poll_interval_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
