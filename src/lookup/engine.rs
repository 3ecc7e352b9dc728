//! The resolver-side orchestration: directory, then weather, then conversion.

use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};
use std::sync::Arc;
use thiserror::Error;

use crate::lookup::types::{PostalCode, TemperatureReport};
use crate::upstream::directory::DirectoryClient;
use crate::upstream::weather::WeatherClient;
use crate::upstream::TransportError;

/// Ways a lookup can fail. Every variant ends the request.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The directory does not know the postal code.
    #[error("postal code not found in directory")]
    NotFound,

    /// The directory could not be reached or answered garbage.
    #[error("directory lookup failed: {0}")]
    DirectoryUnavailable(#[source] TransportError),

    /// The weather service could not produce a reading.
    #[error("weather lookup failed: {0}")]
    WeatherUnavailable(#[source] TransportError),
}

/// Engine chaining the directory and weather lookups.
#[derive(Clone)]
pub struct TemperatureLookup {
    directory: Arc<dyn DirectoryClient>,
    weather: Arc<dyn WeatherClient>,
}

impl TemperatureLookup {
    /// Create a new lookup engine.
    pub fn new(directory: Arc<dyn DirectoryClient>, weather: Arc<dyn WeatherClient>) -> Self {
        Self { directory, weather }
    }

    /// Resolve a postal code into a temperature report.
    ///
    /// `cx` carries the span of the calling handler. Both external calls
    /// become children of it.
    pub async fn report(
        &self,
        cx: &Context,
        code: &PostalCode,
    ) -> Result<TemperatureReport, LookupError> {
        let record = self
            .directory
            .resolve(cx, code)
            .await
            .map_err(LookupError::DirectoryUnavailable)?;

        if !record.found {
            tracing::debug!(postal_code = %code, "Postal code unknown to directory");
            return Err(LookupError::NotFound);
        }

        cx.span()
            .set_attribute(KeyValue::new("city", record.locality.clone()));

        let reading = self
            .weather
            .lookup(cx, &record.locality)
            .await
            .map_err(LookupError::WeatherUnavailable)?;

        tracing::debug!(
            postal_code = %code,
            city = %record.locality,
            celsius = reading.celsius,
            "Temperature resolved"
        );

        Ok(TemperatureReport::from_reading(record.locality, reading))
    }
}
