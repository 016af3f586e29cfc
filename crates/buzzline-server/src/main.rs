//! Buzzline server binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: 0.0.0.0:3000, 10k connections, info logging
//! buzzline-server
//!
//! # Everything overridable
//! buzzline-server --bind 0.0.0.0:8080 --max-connections 512 --log-level debug
//! ```

use buzzline_server::{Server, ServerRuntimeConfig};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Buzzer quiz coordination server
#[derive(Parser, Debug)]
#[command(name = "buzzline-server")]
#[command(about = "Multiplayer buzzer quiz coordination server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    bind: String,

    /// Maximum concurrent WebSocket connections
    #[arg(long, default_value = "10000")]
    max_connections: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Buzzline server starting");

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        max_connections: args.max_connections,
    };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
