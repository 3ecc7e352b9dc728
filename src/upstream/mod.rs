//! Outbound HTTP clients.
//!
//! # Data Flow
//! ```text
//! intake handler
//!     → resolver.rs (peer hop, GET {resolver}/{cep})
//!
//! resolver handler → lookup engine
//!     → directory.rs (GET {directory}/ws/{cep}/json)
//!     → weather.rs (GET {weather}?key=..&q=..)
//! ```
//!
//! # Design Decisions
//! - Every call gets its own client span and carries it in the headers
//! - Every call has a connect timeout and a total deadline
//! - Non-2xx answers are failures; bodies of failed calls are not read
//! - Query strings never show up in errors or logs (they hold the API key)

pub mod directory;
pub mod resolver;
pub mod weather;

use axum::body::Bytes;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use opentelemetry::trace::{SpanKind, TraceContextExt};
use opentelemetry::{Context, KeyValue};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::TimeoutConfig;
use crate::observability::tracing::{end_ok, end_with_error, Telemetry};

pub use directory::{DirectoryClient, ViaCepClient};
pub use resolver::{RelayedResponse, ResolverClient};
pub use weather::{WeatherApiClient, WeatherClient};

/// Failure of a single outbound call.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, timeout or IO failure.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with a non-success status.
    #[error("{url} responded with status {status}")]
    Status { url: String, status: StatusCode },

    /// The upstream answered with something that is not the expected JSON.
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required field is absent from an otherwise valid response.
    #[error("response from {url} is missing `{field}`")]
    MissingField { url: String, field: &'static str },

    /// The configured base URL cannot be used for requests.
    #[error("invalid base url `{0}`")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Build the outbound HTTP client shared by the clients of one process.
pub fn build_http_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .timeout(Duration::from_secs(timeouts.request_secs))
        .build()
        .map_err(TransportError::Client)
}

/// Parse a configured base URL.
pub fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
    let url = Url::parse(raw).map_err(|_| TransportError::InvalidBaseUrl(raw.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(TransportError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

/// A successful (2xx) upstream answer.
#[derive(Debug)]
pub(crate) struct Fetched {
    /// Request URL without its query string.
    pub url: String,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl Fetched {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body).map_err(|source| TransportError::Decode {
            url: self.url.clone(),
            source,
        })
    }
}

/// Send `request` under a new client span that is a child of `cx`.
pub(crate) async fn fetch(
    http: &reqwest::Client,
    telemetry: &Telemetry,
    cx: &Context,
    span_name: &'static str,
    mut request: reqwest::Request,
) -> Result<Fetched, TransportError> {
    let url = display_url(request.url());
    let span_cx = telemetry.start_span(span_name, SpanKind::Client, cx);
    span_cx
        .span()
        .set_attribute(KeyValue::new("http.url", url.clone()));
    telemetry.inject(&span_cx, request.headers_mut());

    tracing::debug!(url = %url, span = span_name, "Calling upstream");

    let result = send(http, request, url).await;
    match &result {
        Ok(_) => end_ok(&span_cx),
        Err(e) => {
            if let TransportError::Status { status, .. } = e {
                span_cx
                    .span()
                    .set_attribute(KeyValue::new("http.status_code", i64::from(status.as_u16())));
            }
            end_with_error(&span_cx, "upstream call failed");
        }
    }
    result
}

async fn send(
    http: &reqwest::Client,
    request: reqwest::Request,
    url: String,
) -> Result<Fetched, TransportError> {
    let response = http
        .execute(request)
        .await
        .map_err(|source| TransportError::Request {
            url: url.clone(),
            source: source.without_url(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status { url, status });
    }

    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    let body = response
        .bytes()
        .await
        .map_err(|source| TransportError::Request {
            url: url.clone(),
            source: source.without_url(),
        })?;

    Ok(Fetched {
        url,
        content_type,
        body,
    })
}

fn display_url(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}
