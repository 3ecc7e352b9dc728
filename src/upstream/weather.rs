//! Current weather client (WeatherAPI-compatible).

use async_trait::async_trait;
use opentelemetry::Context;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use crate::lookup::types::WeatherReading;
use crate::observability::tracing::Telemetry;
use crate::upstream::{fetch, TransportError};

/// Produces the current temperature of a locality.
#[async_trait]
pub trait WeatherClient: Send + Sync {
    async fn lookup(&self, cx: &Context, locality: &str) -> Result<WeatherReading, TransportError>;
}

/// Client for `GET {base}?key={api_key}&q={locality}`.
pub struct WeatherApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    telemetry: Arc<Telemetry>,
}

impl WeatherApiClient {
    pub fn new(
        http: reqwest::Client,
        base_url: Url,
        api_key: impl Into<String>,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key: api_key.into(),
            telemetry,
        }
    }

    fn lookup_url(&self, locality: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("q", locality);
        url
    }
}

#[async_trait]
impl WeatherClient for WeatherApiClient {
    async fn lookup(&self, cx: &Context, locality: &str) -> Result<WeatherReading, TransportError> {
        let url = self.lookup_url(locality);
        let request = self
            .http
            .get(url)
            .build()
            .map_err(|source| TransportError::Request {
                url: self.base_url.to_string(),
                source: source.without_url(),
            })?;

        let fetched = fetch(&self.http, &self.telemetry, cx, "weather.lookup", request).await?;
        let payload: WeatherPayload = fetched.json()?;

        payload
            .current
            .and_then(|current| current.temp_c)
            .map(|celsius| WeatherReading { celsius })
            .ok_or(TransportError::MissingField {
                url: fetched.url,
                field: "current.temp_c",
            })
    }
}

#[derive(Debug, Deserialize)]
struct WeatherPayload {
    current: Option<CurrentConditions>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> WeatherApiClient {
        WeatherApiClient::new(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            "k3y",
            Arc::new(Telemetry::new("test")),
        )
    }

    #[test]
    fn test_locality_is_query_escaped() {
        let url = client("http://api.weatherapi.com/v1/current.json").lookup_url("São Paulo");
        assert_eq!(
            url.as_str(),
            "http://api.weatherapi.com/v1/current.json?key=k3y&q=S%C3%A3o+Paulo"
        );

        let url = client("http://weather.test/current").lookup_url("A&B=C");
        assert_eq!(url.query(), Some("key=k3y&q=A%26B%3DC"));
    }

    #[test]
    fn test_payload_shapes() {
        let payload: WeatherPayload =
            serde_json::from_str(r#"{"location": {"name": "Recife"}, "current": {"temp_c": 28.4}}"#)
                .unwrap();
        assert_eq!(payload.current.and_then(|c| c.temp_c), Some(28.4));

        let payload: WeatherPayload = serde_json::from_str(r#"{"current": {}}"#).unwrap();
        assert_eq!(payload.current.and_then(|c| c.temp_c), None);

        let payload: WeatherPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.current.is_none());
    }
}
