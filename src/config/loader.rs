//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{AppConfig, Service};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file settings.
pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_RESOLVER_URL: &str = "RESOLVER_URL";
pub const ENV_DIRECTORY_URL: &str = "DIRECTORY_URL";
pub const ENV_WEATHER_URL: &str = "WEATHER_URL";
pub const ENV_INTAKE_BIND_ADDRESS: &str = "INTAKE_BIND_ADDRESS";
pub const ENV_RESOLVER_BIND_ADDRESS: &str = "RESOLVER_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration for `service`.
///
/// Reads the TOML file at `path` when given (defaults otherwise), applies
/// environment overrides, then validates.
pub fn load_config(path: Option<&Path>, service: Service) -> Result<AppConfig, ConfigError> {
    load_config_with(path, service, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(
    path: Option<&Path>,
    service: Service,
    env: F,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, env);
    validate_config(&config, service).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables on `config`. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    if let Some(value) = lookup(ENV_WEATHER_API_KEY) {
        config.upstreams.weather_api_key = value;
    }
    if let Some(value) = lookup(ENV_RESOLVER_URL) {
        config.intake.resolver_url = value;
    }
    if let Some(value) = lookup(ENV_DIRECTORY_URL) {
        config.upstreams.directory_url = value;
    }
    if let Some(value) = lookup(ENV_WEATHER_URL) {
        config.upstreams.weather_url = value;
    }
    if let Some(value) = lookup(ENV_INTAKE_BIND_ADDRESS) {
        config.intake.bind_address = value;
    }
    if let Some(value) = lookup(ENV_RESOLVER_BIND_ADDRESS) {
        config.resolver.bind_address = value;
    }
}
