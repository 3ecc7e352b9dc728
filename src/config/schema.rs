//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for both services.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Which of the two services a process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Accepts `POST /` and forwards to the resolver.
    Intake,
    /// Serves `GET /{cep}` from the directory and weather services.
    Resolver,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Intake => "intake",
            Service::Resolver => "resolver",
        }
    }
}

/// Root configuration shared by both services.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Intake service settings.
    pub intake: IntakeConfig,

    /// Resolver service settings.
    pub resolver: ResolverConfig,

    /// External directory and weather services.
    pub upstreams: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Listen address of `service`.
    pub fn bind_address(&self, service: Service) -> &str {
        match service {
            Service::Intake => &self.intake.bind_address,
            Service::Resolver => &self.resolver.bind_address,
        }
    }
}

/// Intake service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Base URL of the resolver service.
    pub resolver_url: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            resolver_url: "http://service-b:8081".to_string(),
        }
    }
}

/// Resolver service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
        }
    }
}

/// External services queried by the resolver.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Postal directory base URL; lookups go to `{directory_url}/ws/{cep}/json`.
    pub directory_url: String,

    /// Current weather endpoint; lookups go to `{weather_url}?key=..&q=..`.
    pub weather_url: String,

    /// Weather service API key. Usually supplied through `WEATHER_API_KEY`.
    pub weather_api_key: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            directory_url: "http://viacep.com.br".to_string(),
            weather_url: "http://api.weatherapi.com/v1/current.json".to_string(),
            weather_api_key: String::new(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Total time for one outbound call in seconds.
    pub request_secs: u64,

    /// Total time for handling one inbound request in seconds.
    pub server_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 10,
            server_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
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
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Write finished spans to the log.
    pub export_spans: bool,

    /// Prefix of the service name reported in spans ("{namespace}.{service}").
    pub service_namespace: String,
}

impl ObservabilityConfig {
    pub fn service_name(&self, service: Service) -> String {
        format!("{}.{}", self.service_namespace, service.name())
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            export_spans: true,
            service_namespace: "cep-weather".to_string(),
        }
    }
}
