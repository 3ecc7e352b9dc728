//! Postal code to current temperature, served by two chained HTTP services.
//!
//! The intake service validates `{"cep": ".."}` and forwards the postal code
//! to the resolver service, which asks a postal directory for the locality
//! and a weather service for its temperature. One W3C trace covers both hops.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod lookup;
pub mod observability;
pub mod upstream;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use observability::Telemetry;
