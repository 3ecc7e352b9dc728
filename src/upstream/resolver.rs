//! Intake-side client for the resolver service.

use axum::body::Bytes;
use axum::http::HeaderValue;
use opentelemetry::Context;
use std::sync::Arc;
use url::Url;

use crate::http::request::X_REQUEST_ID;
use crate::lookup::types::PostalCode;
use crate::observability::tracing::Telemetry;
use crate::upstream::{fetch, TransportError};

/// A resolver answer relayed to the intake caller as is.
#[derive(Debug, Clone)]
pub struct RelayedResponse {
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// Client for `GET {resolver}/{cep}`.
pub struct ResolverClient {
    http: reqwest::Client,
    base_url: Url,
    telemetry: Arc<Telemetry>,
}

impl ResolverClient {
    pub fn new(http: reqwest::Client, base_url: Url, telemetry: Arc<Telemetry>) -> Self {
        Self {
            http,
            base_url,
            telemetry,
        }
    }

    fn temperature_url(&self, code: &PostalCode) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(code.as_str());
        Ok(url)
    }

    /// Ask the resolver for the temperature at `code`.
    ///
    /// Any non-2xx answer is an error; its status and body are not kept.
    pub async fn temperature(
        &self,
        cx: &Context,
        code: &PostalCode,
        request_id: Option<&HeaderValue>,
    ) -> Result<RelayedResponse, TransportError> {
        let url = self.temperature_url(code)?;
        let mut builder = self.http.get(url.clone());
        if let Some(id) = request_id {
            builder = builder.header(X_REQUEST_ID, id.clone());
        }
        let request = builder.build().map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        let fetched = fetch(&self.http, &self.telemetry, cx, "resolver.call", request).await?;
        Ok(RelayedResponse {
            content_type: fetched.content_type,
            body: fetched.body,
        })
    }
}
