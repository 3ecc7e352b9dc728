//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that the secrets a service needs are present
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Only the sections the started service uses are checked

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{AppConfig, Service};

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
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

/// Validate `config` for running `service`.
pub fn validate_config(config: &AppConfig, service: Service) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match service {
        Service::Intake => {
            check_bind_address(&mut errors, "intake.bind_address", &config.intake.bind_address);
            check_http_url(&mut errors, "intake.resolver_url", &config.intake.resolver_url);
        }
        Service::Resolver => {
            check_bind_address(
                &mut errors,
                "resolver.bind_address",
                &config.resolver.bind_address,
            );
            check_http_url(&mut errors, "upstreams.directory_url", &config.upstreams.directory_url);
            check_http_url(&mut errors, "upstreams.weather_url", &config.upstreams.weather_url);
            if config.upstreams.weather_api_key.trim().is_empty() {
                errors.push(ValidationError::new(
                    "upstreams.weather_api_key",
                    "must be set (e.g. through WEATHER_API_KEY)",
                ));
            }
        }
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.server_secs", timeouts.server_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_bind_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = value.parse::<SocketAddr>() {
        errors.push(ValidationError::new(field, format!("invalid address `{value}`: {e}")));
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme `{}`", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid url `{value}`: {e}"))),
    }
}
