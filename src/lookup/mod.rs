//! Postal code to temperature lookup.
//!
//! # Data Flow
//! ```text
//! PostalCode (validated, 8 bytes)
//!     → upstream::directory (postal code → locality)
//!     → [not found? stop with 404]
//!     → upstream::weather (locality → Celsius)
//!     → temperature.rs (Celsius → Fahrenheit, Kelvin)
//!     → TemperatureReport
//! ```
//!
//! # Design Decisions
//! - Lookups are strictly sequential; the weather call needs the locality
//! - No caching and no retries; one failed call fails the request
//! - Clients sit behind traits so the engine never sees HTTP

pub mod engine;
pub mod temperature;
pub mod types;

pub use engine::{LookupError, TemperatureLookup};
pub use types::{
    DirectoryRecord, InvalidPostalCode, PostalCode, PostalCodeRequest, TemperatureReport,
    WeatherReading,
};
