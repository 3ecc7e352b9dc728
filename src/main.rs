//! Postal code weather services.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller
//!     │  POST / {"cep": "01001000"}
//!     ▼
//!   intake      validate body, open span, inject traceparent
//!     │  GET /01001000
//!     ▼
//!   resolver    validate path, continue trace
//!     ├──▶ postal directory   (cep → locality)
//!     └──▶ weather service    (locality → Celsius)
//!     │  {"city", "temp_C", "temp_F", "temp_K"}
//!     ▼
//!   caller
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cep_weather::config::{load_config, Service};
use cep_weather::lifecycle::startup;
use cep_weather::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "cep-weather")]
#[command(about = "Postal code to temperature services", long_about = None, version)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the intake service (POST /)
    Intake,
    /// Run the resolver service (GET /{cep})
    Resolver,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let service = match cli.command {
        Commands::Intake => Service::Intake,
        Commands::Resolver => Service::Resolver,
    };

    let config = load_config(cli.config.as_deref(), service)?;
    init_logging(&config.observability)?;

    tracing::info!(
        service = service.name(),
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.bind_address(service),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::run(config, service).await?;
    Ok(())
}
