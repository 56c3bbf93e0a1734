// src/main.rs
//! Auth server entry point
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use userblog_auth::{
    auth::{create_auth_routes, AuthService, MemoryStorage},
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    logging,
};

#[derive(Parser)]
#[command(name = "userblog-auth")]
#[command(about = "User/blog management authentication server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Path to the TOML config file
    #[arg(long, env = "CONFIG_PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Address to bind, overrides config and SERVER_HOST
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides config and SERVER_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    logging::init(&config.log.level)?;
    info!("Starting userblog-auth v{}", env!("CARGO_PKG_VERSION"));

    let storage = Arc::new(MemoryStorage::with_default_roles());
    let service = Arc::new(AuthService::new(storage, &config.auth)?);
    let app = create_auth_routes(service);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
