//! Resolver service handler: `GET /{cep}`.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use opentelemetry::trace::{SpanKind, TraceContextExt};
use opentelemetry::KeyValue;
use std::sync::Arc;

use crate::http::response::ApiError;
use crate::lookup::types::PostalCode;
use crate::lookup::TemperatureLookup;
use crate::observability::tracing::{end_ok, end_with_error, Telemetry};

/// State injected into the resolver handler.
#[derive(Clone)]
pub struct ResolverState {
    pub telemetry: Arc<Telemetry>,
    pub lookup: TemperatureLookup,
}

/// Resolve a postal code into a temperature report.
pub async fn handle_resolve(
    State(state): State<ResolverState>,
    cep: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
) -> Response {
    let Path(cep) = match cep {
        Ok(cep) => cep,
        Err(rejection) => {
            return ApiError::UnreadablePath(rejection.body_text()).into_response();
        }
    };
    let code = match PostalCode::parse(&cep) {
        Ok(code) => code,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let parent = state.telemetry.extract(&headers);
    let cx = state
        .telemetry
        .start_span("resolver.request", SpanKind::Server, &parent);
    cx.span()
        .set_attribute(KeyValue::new("postal_code", code.to_string()));

    match state.lookup.report(&cx, &code).await {
        Ok(report) => {
            cx.span()
                .set_attribute(KeyValue::new("http.status_code", 200_i64));
            end_ok(&cx);
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            let err = ApiError::from(e);
            cx.span().set_attribute(KeyValue::new(
                "http.status_code",
                i64::from(err.status().as_u16()),
            ));
            end_with_error(&cx, err.message());
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::http::HttpServer;
    use crate::lookup::types::{DirectoryRecord, WeatherReading};
    use crate::upstream::{DirectoryClient, TransportError, WeatherClient};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use opentelemetry::Context;
    use tower::ServiceExt;

    struct StubDirectory;

    #[async_trait]
    impl DirectoryClient for StubDirectory {
        async fn resolve(
            &self,
            _cx: &Context,
            code: &PostalCode,
        ) -> Result<DirectoryRecord, TransportError> {
            match code.as_str() {
                "99999999" => Ok(DirectoryRecord::not_found()),
                "00000000" => Err(TransportError::Status {
                    url: "http://directory.test/".into(),
                    status: StatusCode::BAD_REQUEST,
                }),
                _ => Ok(DirectoryRecord {
                    found: true,
                    locality: "Curitiba".into(),
                    ..Default::default()
                }),
            }
        }
    }

    struct StubWeather;

    #[async_trait]
    impl WeatherClient for StubWeather {
        async fn lookup(
            &self,
            _cx: &Context,
            _locality: &str,
        ) -> Result<WeatherReading, TransportError> {
            Ok(WeatherReading { celsius: 10.0 })
        }
    }

    async fn call(path: &str) -> (StatusCode, String) {
        let lookup = TemperatureLookup::new(Arc::new(StubDirectory), Arc::new(StubWeather));
        let router = HttpServer::with_lookup(
            &AppConfig::default(),
            Arc::new(Telemetry::new("test")),
            lookup,
        )
        .into_router();

        let response = router
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let (status, body) = call("/80010000").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["city"], "Curitiba");
        assert_eq!(json["temp_C"].as_f64(), Some(10.0));
        assert_eq!(json["temp_F"].as_f64(), Some(50.0));
        assert!((json["temp_K"].as_f64().unwrap() - 283.15).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_resolve_error_statuses() {
        assert_eq!(
            call("/123").await,
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid zipcode".to_string())
        );
        assert_eq!(
            call("/123456789").await,
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid zipcode".to_string())
        );
        assert_eq!(
            call("/99999999").await,
            (StatusCode::NOT_FOUND, "can not find zipcode".to_string())
        );
        assert_eq!(
            call("/00000000").await,
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error fetching zipcode data".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_resolve_undecodable_path() {
        assert_eq!(
            call("/%FF%FF%FF%FF").await,
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid zipcode".to_string())
        );
        assert_eq!(
            call("/%FF%FF%FF%FF%FF%FF%FF%FF").await,
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid zipcode".to_string())
        );
    }

    #[tokio::test]
    async fn test_resolve_counts_bytes() {
        // Four characters, eight bytes
        assert_eq!(call("/%C3%A3%C3%A3%C3%A3%C3%A3").await.0, StatusCode::OK);
        // Eight characters, sixteen bytes
        assert_eq!(
            call("/%C3%A3%C3%A3%C3%A3%C3%A3%C3%A3%C3%A3%C3%A3%C3%A3").await,
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid zipcode".to_string())
        );
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(call("/health").await, (StatusCode::OK, "ok".to_string()));
    }
}
