//! Lookup pipeline types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::lookup::temperature::{celsius_to_fahrenheit, celsius_to_kelvin};

/// Required length of a postal code (CEP).
pub const POSTAL_CODE_LEN: usize = 8;

/// A postal code is rejected when it is not exactly eight bytes long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("postal code must be {POSTAL_CODE_LEN} bytes long, got {length}")]
pub struct InvalidPostalCode {
    pub length: usize,
}

/// A validated postal code.
///
/// Only the length in bytes of the raw string is checked. The directory
/// service decides whether the content is meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Validate a raw postal code.
    pub fn parse(raw: &str) -> Result<Self, InvalidPostalCode> {
        let length = raw.len();
        if length != POSTAL_CODE_LEN {
            return Err(InvalidPostalCode { length });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request body accepted by the intake service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostalCodeRequest {
    /// Raw postal code. Missing or null means empty, which then fails
    /// validation.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cep: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Locality record returned by the postal directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// False when the directory reported the code as unknown.
    pub found: bool,
    /// City name, the input to the weather lookup.
    pub locality: String,
    pub postal_code: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    /// Two-letter state code.
    pub state: String,
    pub ibge: String,
    pub gia: String,
    pub ddd: String,
    pub siafi: String,
}

impl DirectoryRecord {
    /// Record for a postal code the directory does not know.
    pub fn not_found() -> Self {
        Self::default()
    }
}

/// Current conditions for a locality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherReading {
    pub celsius: f64,
}

/// Final response body of the resolver service.
///
/// Whole-degree values are written without a fraction (`25`, not `25.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReport {
    pub city: String,
    #[serde(rename = "temp_C", serialize_with = "shortest_number")]
    pub temp_c: f64,
    #[serde(rename = "temp_F", serialize_with = "shortest_number")]
    pub temp_f: f64,
    #[serde(rename = "temp_K", serialize_with = "shortest_number")]
    pub temp_k: f64,
}

/// Largest magnitude below which every integral `f64` is exact in an `i64`.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

fn shortest_number<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.fract() == 0.0 && value.abs() < EXACT_INTEGER_LIMIT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

impl TemperatureReport {
    /// Build the report for a city from a Celsius reading.
    pub fn from_reading(city: impl Into<String>, reading: WeatherReading) -> Self {
        Self {
            city: city.into(),
            temp_c: reading.celsius,
            temp_f: celsius_to_fahrenheit(reading.celsius),
            temp_k: celsius_to_kelvin(reading.celsius),
        }
    }
}
