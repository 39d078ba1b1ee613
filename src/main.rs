//! Terminal Chat Server - Entry Point
//!
//! Parses arguments, starts the TCP listener and hands it to `serve`.

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use terminal_chat::{serve, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=terminal_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("terminal_chat=info")),
        )
        .init();

    let config = ServerConfig::parse();
    let addr = config.endpoint.addr();

    let listener = TcpListener::bind(&addr).await?;
    info!("Chat server listening on {}", listener.local_addr()?);

    serve(listener, config.session).await;

    Ok(())
}
