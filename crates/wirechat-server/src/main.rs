//! WireChat relay server — entry point.
//!
//! Accepts raw TCP connections, upgrades each one with the handshake from
//! `wirechat-core`, and relays every text message to all connected peers.
//!
//! # Usage
//!
//! ```text
//! wirechat-server [OPTIONS]
//!
//! Options:
//!   --port <PORT>                 Listen port [default: 8080]
//!   --bind <ADDR>                 Bind address [default: 0.0.0.0]
//!   --heartbeat-interval <SECS>   Keepalive ping interval [default: 5]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable                      | Default   | Description             |
//! |-------------------------------|-----------|-------------------------|
//! | `WIRECHAT_PORT`               | `8080`    | Listen port             |
//! | `WIRECHAT_BIND`               | `0.0.0.0` | Bind address            |
//! | `WIRECHAT_HEARTBEAT_INTERVAL` | `5`       | Ping interval (seconds) |
//!
//! Log verbosity is controlled by `RUST_LOG` (e.g. `RUST_LOG=debug`).

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wirechat_server::domain::ServerConfig;
use wirechat_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WireChat relay server.
///
/// Listens for chat clients on raw TCP and fans every message out to all
/// connected peers.
#[derive(Debug, Parser)]
#[command(
    name = "wirechat-server",
    about = "Text-chat relay over raw TCP with upgrade handshake and heartbeats",
    version
)]
struct Cli {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 8080, env = "WIRECHAT_PORT")]
    port: u16,

    /// IP address to bind the listener to.
    ///
    /// Use `0.0.0.0` to accept connections from any interface, or
    /// `127.0.0.1` to accept only local connections.
    #[arg(long, default_value = "0.0.0.0", env = "WIRECHAT_BIND")]
    bind: String,

    /// Keepalive ping interval in seconds.
    ///
    /// Every open connection receives a one-way ping frame at this cadence;
    /// no reply is awaited.
    #[arg(long, default_value_t = 5, env = "WIRECHAT_HEARTBEAT_INTERVAL")]
    heartbeat_interval: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` together with `--port` does not form a
    /// valid socket address.
    fn into_server_config(self) -> anyhow::Result<ServerConfig> {
        let bind_addr: SocketAddr = format!("{}:{}", self.bind, self.port)
            .parse()
            .with_context(|| format!("invalid bind address: '{}:{}'", self.bind, self.port))?;

        Ok(ServerConfig {
            bind_addr,
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging; level overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_server_config()?;

    info!(
        "WireChat relay starting on {} (heartbeat every {:?})",
        config.bind_addr, config.heartbeat_interval
    );

    // Shutdown flag shared with the accept loop, set by Ctrl-C.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    run_server(config, running).await?;

    info!("WireChat relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
