//! Caller-visible errors.
//!
//! # Responsibilities
//! - Map pipeline failures to HTTP status codes and short plain-text bodies
//! - Log the internal cause where the error is turned into a response
//!
//! # Design Decisions
//! - Bodies never include upstream error text
//! - The intake side collapses every resolver failure into one 500

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::lookup::types::InvalidPostalCode;
use crate::lookup::LookupError;
use crate::upstream::TransportError;

pub const MSG_INVALID_BODY: &str = "invalid request body";
pub const MSG_INVALID_ZIPCODE: &str = "invalid zipcode";
pub const MSG_NOT_FOUND: &str = "can not find zipcode";
pub const MSG_DIRECTORY_FAILED: &str = "error fetching zipcode data";
pub const MSG_RESOLVER_FAILED: &str = "error communicating with resolver";

/// Errors returned to callers of either service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body could not be read or is not the expected JSON.
    #[error("invalid request body")]
    MalformedRequest(String),

    /// The postal code is not eight bytes long.
    #[error("invalid zipcode")]
    Validation(#[from] InvalidPostalCode),

    /// The path segment holding the postal code could not be decoded.
    #[error("invalid zipcode")]
    UnreadablePath(String),

    /// The directory does not know the postal code.
    #[error("can not find zipcode")]
    NotFound,

    /// The directory failed or answered garbage.
    #[error("error fetching zipcode data")]
    DirectoryUnavailable(#[source] TransportError),

    /// The weather service failed. Reported like an unknown postal code.
    #[error("can not find zipcode")]
    WeatherUnavailable(#[source] TransportError),

    /// The intake could not get an answer from the resolver.
    #[error("error communicating with resolver")]
    UpstreamUnavailable(#[source] TransportError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) | ApiError::UnreadablePath(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::NotFound | ApiError::WeatherUnavailable(_) => StatusCode::NOT_FOUND,
            ApiError::DirectoryUnavailable(_) | ApiError::UpstreamUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Response body text.
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::MalformedRequest(_) => MSG_INVALID_BODY,
            ApiError::Validation(_) | ApiError::UnreadablePath(_) => MSG_INVALID_ZIPCODE,
            ApiError::NotFound | ApiError::WeatherUnavailable(_) => MSG_NOT_FOUND,
            ApiError::DirectoryUnavailable(_) => MSG_DIRECTORY_FAILED,
            ApiError::UpstreamUnavailable(_) => MSG_RESOLVER_FAILED,
        }
    }

    fn log(&self) {
        let status = self.status().as_u16();
        match self {
            ApiError::MalformedRequest(detail) => {
                tracing::debug!(status, detail = %detail, "Rejected request body");
            }
            ApiError::Validation(e) => {
                tracing::debug!(status, error = %e, "Rejected postal code");
            }
            ApiError::UnreadablePath(detail) => {
                tracing::debug!(status, detail = %detail, "Rejected postal code path");
            }
            ApiError::NotFound => tracing::debug!(status, "Postal code not found"),
            ApiError::WeatherUnavailable(e) => {
                tracing::warn!(status, error = %e, "Weather lookup failed");
            }
            ApiError::DirectoryUnavailable(e) => {
                tracing::error!(status, error = %e, "Directory lookup failed");
            }
            ApiError::UpstreamUnavailable(e) => {
                tracing::error!(status, error = %e, "Resolver call failed");
            }
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound => ApiError::NotFound,
            LookupError::DirectoryUnavailable(e) => ApiError::DirectoryUnavailable(e),
            LookupError::WeatherUnavailable(e) => ApiError::WeatherUnavailable(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        (self.status(), self.message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn transport() -> TransportError {
        TransportError::Status {
            url: "http://upstream.test/".into(),
            status: StatusCode::BAD_GATEWAY,
        }
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::MalformedRequest("eof".into()), 400, MSG_INVALID_BODY),
            (ApiError::Validation(InvalidPostalCode { length: 3 }), 422, MSG_INVALID_ZIPCODE),
            (ApiError::UnreadablePath("invalid utf-8".into()), 422, MSG_INVALID_ZIPCODE),
            (ApiError::NotFound, 404, MSG_NOT_FOUND),
            (ApiError::DirectoryUnavailable(transport()), 500, MSG_DIRECTORY_FAILED),
            (ApiError::WeatherUnavailable(transport()), 404, MSG_NOT_FOUND),
            (ApiError::UpstreamUnavailable(transport()), 500, MSG_RESOLVER_FAILED),
        ];

        for (err, status, message) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.message(), message);
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn test_lookup_error_conversion() {
        assert!(matches!(ApiError::from(LookupError::NotFound), ApiError::NotFound));
        assert!(matches!(
            ApiError::from(LookupError::WeatherUnavailable(transport())),
            ApiError::WeatherUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_body_hides_cause() {
        let response = ApiError::UpstreamUnavailable(transport()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], MSG_RESOLVER_FAILED.as_bytes());
    }
}
