//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router of the intake or the resolver service
//! - Build the outbound clients each service needs
//! - Wire up middleware (timeout, request ID, request logging)
//! - Serve on a listener until shutdown

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, Service, TimeoutConfig};
use crate::http::intake::{handle_intake, IntakeState};
use crate::http::request::MakeRequestUuid;
use crate::http::resolver::{handle_resolve, ResolverState};
use crate::lookup::TemperatureLookup;
use crate::observability::tracing::Telemetry;
use crate::upstream::{
    build_http_client, parse_base_url, ResolverClient, TransportError, ViaCepClient,
    WeatherApiClient,
};

/// HTTP server for one of the two services.
pub struct HttpServer {
    router: Router,
    service: Service,
}

impl HttpServer {
    /// Intake service: `POST /` forwarding to the resolver.
    pub fn intake(config: &AppConfig, telemetry: Arc<Telemetry>) -> Result<Self, TransportError> {
        let http = build_http_client(&config.timeouts)?;
        let resolver_url = parse_base_url(&config.intake.resolver_url)?;

        let state = IntakeState {
            resolver: Arc::new(ResolverClient::new(http, resolver_url, telemetry.clone())),
            telemetry,
        };

        let routes = Router::new()
            .route("/", post(handle_intake))
            .route("/health", get(health))
            .with_state(state);

        Ok(Self {
            router: Self::with_middleware(routes, &config.timeouts),
            service: Service::Intake,
        })
    }

    /// Resolver service backed by the configured directory and weather services.
    pub fn resolver(
        config: &AppConfig,
        telemetry: Arc<Telemetry>,
    ) -> Result<Self, TransportError> {
        let http = build_http_client(&config.timeouts)?;
        let directory = ViaCepClient::new(
            http.clone(),
            parse_base_url(&config.upstreams.directory_url)?,
            telemetry.clone(),
        );
        let weather = WeatherApiClient::new(
            http,
            parse_base_url(&config.upstreams.weather_url)?,
            config.upstreams.weather_api_key.clone(),
            telemetry.clone(),
        );

        let lookup = TemperatureLookup::new(Arc::new(directory), Arc::new(weather));
        Ok(Self::with_lookup(config, telemetry, lookup))
    }

    /// Resolver service backed by an arbitrary lookup engine.
    pub fn with_lookup(
        config: &AppConfig,
        telemetry: Arc<Telemetry>,
        lookup: TemperatureLookup,
    ) -> Self {
        let state = ResolverState { telemetry, lookup };

        let routes = Router::new()
            .route("/health", get(health))
            .route("/{cep}", get(handle_resolve))
            .with_state(state);

        Self {
            router: Self::with_middleware(routes, &config.timeouts),
            service: Service::Resolver,
        }
    }

    /// Wrap routes with the middleware shared by both services.
    #[allow(deprecated)]
    fn with_middleware(routes: Router, timeouts: &TimeoutConfig) -> Router {
        routes
            .layer(TimeoutLayer::new(Duration::from_secs(timeouts.server_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router, for driving the service without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            service = self.service.name(),
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(service = self.service.name(), "HTTP server stopped");
        Ok(())
    }
}

async fn health() -> &'static str {
    "ok"
}
