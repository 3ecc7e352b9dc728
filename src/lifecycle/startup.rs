//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the telemetry of the process
//! - Build the server for the selected service
//! - Bind the listener and serve until a shutdown signal
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{AppConfig, ObservabilityConfig, Service};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{LogSpanExporter, Telemetry};
use crate::upstream::TransportError;

/// Error type for process startup and serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build outbound clients: {0}")]
    Clients(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Telemetry for `service` as configured.
pub fn build_telemetry(config: &ObservabilityConfig, service: Service) -> Telemetry {
    let name = config.service_name(service);
    if config.export_spans {
        Telemetry::with_exporter(name.clone(), LogSpanExporter::new(name))
    } else {
        Telemetry::new(name)
    }
}

/// Run `service` until SIGINT/SIGTERM.
pub async fn run(config: AppConfig, service: Service) -> Result<(), StartupError> {
    let telemetry = Arc::new(build_telemetry(&config.observability, service));

    let server = match service {
        Service::Intake => HttpServer::intake(&config, telemetry.clone())?,
        Service::Resolver => HttpServer::resolver(&config, telemetry.clone())?,
    };

    let listener = TcpListener::bind(config.bind_address(service)).await?;
    tracing::info!(
        service = service.name(),
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let served = server.run(listener, server_shutdown).await;
    telemetry.shutdown();
    served?;

    tracing::info!(service = service.name(), "Shutdown complete");
    Ok(())
}
