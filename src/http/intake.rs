//! Intake service handler: `POST /`.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use opentelemetry::trace::{SpanKind, TraceContextExt};
use opentelemetry::KeyValue;
use std::sync::Arc;

use crate::http::request::X_REQUEST_ID;
use crate::http::response::ApiError;
use crate::lookup::types::{PostalCode, PostalCodeRequest};
use crate::observability::tracing::{end_ok, end_with_error, Telemetry};
use crate::upstream::ResolverClient;

/// State injected into the intake handler.
#[derive(Clone)]
pub struct IntakeState {
    pub telemetry: Arc<Telemetry>,
    pub resolver: Arc<ResolverClient>,
}

/// Validate `{"cep": ".."}` and relay the resolver's answer.
pub async fn handle_intake(
    State(state): State<IntakeState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let code = match parse_body(body) {
        Ok(code) => code,
        Err(e) => return e.into_response(),
    };

    let parent = state.telemetry.extract(&headers);
    let cx = state
        .telemetry
        .start_span("intake.request", SpanKind::Server, &parent);
    cx.span()
        .set_attribute(KeyValue::new("postal_code", code.to_string()));

    let request_id = headers.get(X_REQUEST_ID);
    match state.resolver.temperature(&cx, &code, request_id).await {
        Ok(relayed) => {
            end_ok(&cx);
            let mut response = (StatusCode::OK, relayed.body).into_response();
            if let Some(content_type) = relayed.content_type {
                response.headers_mut().insert(CONTENT_TYPE, content_type);
            }
            response
        }
        Err(e) => {
            let err = ApiError::UpstreamUnavailable(e);
            end_with_error(&cx, err.message());
            err.into_response()
        }
    }
}

fn parse_body(body: Result<Bytes, BytesRejection>) -> Result<PostalCode, ApiError> {
    let body = body.map_err(|rejection| ApiError::MalformedRequest(rejection.to_string()))?;
    let request: PostalCodeRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::MalformedRequest(e.to_string()))?;
    Ok(PostalCode::parse(&request.cep)?)
}
