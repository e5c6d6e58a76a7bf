//! Orbitrack HTTP Server Binary
//!
//! Spawns the real-time and analysis workers, sets up the HTTP router and
//! starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin orbitrack-server
//!
//! ORBITRACK_CONFIG=./orbitrack.toml PORT=9000 cargo run --bin orbitrack-server
//! ```
//!
//! # Environment Variables
//!
//! - `ORBITRACK_CONFIG`: Path to a TOML config file (default: searched in the working directory)
//! - `HOST`: Server host (overrides `server.host`)
//! - `PORT`: Server port (overrides `server.port`)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use orbitrack::config::{ConfigError, EngineConfig};
use orbitrack::http::{create_router, AppState};
use orbitrack::propagation::Sgp4Service;
use orbitrack::runtime::{EngineHandle, ServiceLoader};

fn load_config() -> anyhow::Result<EngineConfig> {
    if let Ok(path) = env::var("ORBITRACK_CONFIG") {
        info!("Loading configuration from {}", path);
        return Ok(EngineConfig::from_file(&path)?);
    }
    match EngineConfig::from_default_location() {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound) => {
            warn!("No configuration file found, using defaults");
            Ok(EngineConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Orbitrack HTTP Server");

    let config = load_config()?;
    let twilight = config.visibility.twilight_sun_elevation_deg;

    let engine = EngineHandle::spawn(&config, |_| {
        ServiceLoader::blocking(move || Ok(Sgp4Service::new(twilight)))
    });
    info!("Engine workers started");

    let app = create_router(AppState::new(engine));

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| config.server.host.clone());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
