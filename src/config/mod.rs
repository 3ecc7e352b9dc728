//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, defaults for missing fields)
//!     → environment overrides (secrets, peer URLs, bind addresses)
//!     → validation.rs (semantic checks for the service being started)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Secrets come from the environment, never from source
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, IntakeConfig, LogFormat, ObservabilityConfig, ResolverConfig, Service,
    TimeoutConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
