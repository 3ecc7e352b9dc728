//! Postal directory client (ViaCEP-compatible).

use async_trait::async_trait;
use opentelemetry::Context;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use crate::lookup::types::{DirectoryRecord, PostalCode};
use crate::observability::tracing::Telemetry;
use crate::upstream::{fetch, TransportError};

/// Resolves a postal code into a locality record.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Look up `code`. An unknown code is `Ok` with `found == false`.
    async fn resolve(
        &self,
        cx: &Context,
        code: &PostalCode,
    ) -> Result<DirectoryRecord, TransportError>;
}

/// Client for `GET {base}/ws/{cep}/json`.
pub struct ViaCepClient {
    http: reqwest::Client,
    base_url: Url,
    telemetry: Arc<Telemetry>,
}

impl ViaCepClient {
    pub fn new(http: reqwest::Client, base_url: Url, telemetry: Arc<Telemetry>) -> Self {
        Self {
            http,
            base_url,
            telemetry,
        }
    }

    fn lookup_url(&self, code: &PostalCode) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["ws", code.as_str(), "json"]);
        Ok(url)
    }
}

#[async_trait]
impl DirectoryClient for ViaCepClient {
    async fn resolve(
        &self,
        cx: &Context,
        code: &PostalCode,
    ) -> Result<DirectoryRecord, TransportError> {
        let url = self.lookup_url(code)?;
        let request = self
            .http
            .get(url.clone())
            .build()
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let fetched = fetch(&self.http, &self.telemetry, cx, "directory.lookup", request).await?;
        let payload: ViaCepPayload = fetched.json()?;
        Ok(payload.into())
    }
}

/// The `erro` flag has been sent both as `"true"` and as `true`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorFlag {
    Bool(bool),
    Text(String),
}

impl ErrorFlag {
    fn is_set(&self) -> bool {
        match self {
            ErrorFlag::Bool(flag) => *flag,
            ErrorFlag::Text(text) => text == "true",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ViaCepPayload {
    #[serde(default)]
    erro: Option<ErrorFlag>,
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    ibge: String,
    #[serde(default)]
    gia: String,
    #[serde(default)]
    ddd: String,
    #[serde(default)]
    siafi: String,
}

impl From<ViaCepPayload> for DirectoryRecord {
    fn from(payload: ViaCepPayload) -> Self {
        if payload.erro.as_ref().is_some_and(ErrorFlag::is_set) {
            return DirectoryRecord::not_found();
        }
        DirectoryRecord {
            found: true,
            locality: payload.localidade,
            postal_code: payload.cep,
            street: payload.logradouro,
            complement: payload.complemento,
            neighborhood: payload.bairro,
            state: payload.uf,
            ibge: payload.ibge,
            gia: payload.gia,
            ddd: payload.ddd,
            siafi: payload.siafi,
        }
    }
}
