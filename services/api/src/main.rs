use std::net::SocketAddr;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod routes;
mod state;

use access_log::LoggerConfig;

use crate::{
    config::{RequestLogConfig, ServerConfig},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting API service");

    // Request logging is fixed for the lifetime of the process
    let logger_config = LoggerConfig::from_env()?;
    let app_state = AppState {
        mode: logger_config.mode,
    };
    let logger = RequestLogConfig::load()?.logger(logger_config);

    let server_config = ServerConfig::load()?;

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state, &logger);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
