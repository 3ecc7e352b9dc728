//! Shared utilities for integration testing.

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Router,
};
use futures_util::future::BoxFuture;
use opentelemetry_sdk::export::trace::{ExportResult, SpanData, SpanExporter};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use cep_weather::{AppConfig, HttpServer, Shutdown};

/// What a mock backend saw.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    /// Trace id from the `traceparent` header.
    pub fn trace_id(&self) -> Option<String> {
        self.header("traceparent")
            .and_then(|value| value.split('-').nth(1).map(str::to_string))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// A running mock backend.
#[derive(Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` maps each request to a status code and a JSON body.
pub async fn start_programmable_backend<F>(f: F) -> MockBackend
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    start_delayed_backend(Duration::ZERO, f).await
}

/// Like [`start_programmable_backend`], answering only after `delay`.
pub async fn start_delayed_backend<F>(delay: Duration, f: F) -> MockBackend
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let f = Arc::new(f);
    let log = requests.clone();
    let app = Router::new().fallback(move |request: Request| {
        let f = f.clone();
        let log = log.clone();
        async move {
            let recorded = RecordedRequest {
                path: request.uri().path().to_string(),
                query: request.uri().query().map(str::to_string),
                headers: request.headers().clone(),
            };
            let (status, body) = (*f)(&recorded);
            log.lock().unwrap().push(recorded);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            (
                StatusCode::from_u16(status).unwrap(),
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response()
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend { addr, requests }
}

/// URL of a port nobody listens on.
#[allow(dead_code)]
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// A service under test. Shuts down when dropped.
pub struct RunningServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl RunningServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `server` on an ephemeral port.
pub async fn start_server(server: HttpServer) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningServer { addr, shutdown }
}

/// Config pointing the services at the given URLs.
pub fn test_config(resolver_url: &str, directory_url: &str, weather_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.intake.resolver_url = resolver_url.to_string();
    config.upstreams.directory_url = directory_url.to_string();
    config.upstreams.weather_url = weather_url.to_string();
    config.upstreams.weather_api_key = "test-key".to_string();
    config.timeouts.connect_secs = 1;
    config.timeouts.request_secs = 2;
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Directory fixture keyed by request path.
#[allow(dead_code)]
pub fn directory_fixture(request: &RecordedRequest) -> (u16, String) {
    match request.path.as_str() {
        "/ws/01001000/json" => (
            200,
            r#"{"cep":"01001-000","logradouro":"Praça da Sé","complemento":"lado ímpar","bairro":"Sé","localidade":"São Paulo","uf":"SP","ibge":"3550308","gia":"1004","ddd":"11","siafi":"7107"}"#
                .to_string(),
        ),
        "/ws/99999999/json" => (200, r#"{"erro": "true"}"#.to_string()),
        "/ws/88888888/json" => (200, r#"{"erro": true}"#.to_string()),
        _ => (400, r#"{"message": "bad request"}"#.to_string()),
    }
}

/// Weather fixture answering 25 °C for any locality.
#[allow(dead_code)]
pub fn weather_fixture(_request: &RecordedRequest) -> (u16, String) {
    (
        200,
        r#"{"location":{"name":"Sao Paulo","region":"Sao Paulo"},"current":{"temp_c":25.0,"temp_f":77.0,"condition":{"text":"Sunny"}}}"#
            .to_string(),
    )
}

/// Span exporter keeping every finished span in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingExporter {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

#[allow(dead_code)]
impl RecordingExporter {
    pub fn spans(&self) -> Vec<SpanData> {
        self.spans.lock().unwrap().clone()
    }

    /// Wait until at least `count` spans were exported.
    pub async fn wait_for(&self, count: usize) -> Vec<SpanData> {
        for _ in 0..100 {
            let spans = self.spans();
            if spans.len() >= count {
                return spans;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.spans()
    }

    pub fn named(&self, name: &str) -> SpanData {
        self.spans()
            .into_iter()
            .find(|span| span.name == name)
            .unwrap_or_else(|| panic!("no span named {name}"))
    }
}

impl SpanExporter for RecordingExporter {
    fn export(&mut self, batch: Vec<SpanData>) -> BoxFuture<'static, ExportResult> {
        self.spans.lock().unwrap().extend(batch);
        Box::pin(std::future::ready(Ok(())))
    }
}
