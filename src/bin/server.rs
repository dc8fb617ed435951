//! respkv Server Binary
//!
//! Replays the AOF and starts the TCP server.

use std::sync::Arc;

use clap::Parser;
use respkv::network::Server;
use respkv::{AofSyncPolicy, Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// respkv Server
#[derive(Parser, Debug)]
#[command(name = "respkv-server")]
#[command(about = "In-memory key-value server with append-only file persistence")]
#[command(version)]
struct Args {
    /// Append-only file path
    #[arg(short, long, default_value = "./respkv_data/appendonly.aof")]
    aof: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// AOF fsync policy: always, everysec or no
    #[arg(long, default_value = "everysec")]
    appendfsync: AofSyncPolicy,

    /// Connection read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,respkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("respkv server v{}", respkv::VERSION);
    tracing::info!("AOF: {} (fsync {})", args.aof, args.appendfsync);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .aof_path(&args.aof)
        .aof_sync_policy(args.appendfsync)
        .listen_addr(&args.listen)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    // Open engine (replays the AOF)
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let mut server = Server::new(config, Arc::clone(&engine));

    // Ctrl+C stops the accept loop and hangs up on the current client; the
    // AOF is closed below
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.shutdown();
    }) {
        tracing::warn!("Could not install Ctrl+C handler: {}", e);
    }

    let served = server.run();
    if let Err(e) = &served {
        tracing::error!("Server error: {}", e);
    }
    drop(server);

    match Arc::try_unwrap(engine) {
        Ok(engine) => {
            if let Err(e) = engine.close() {
                tracing::error!("Failed to close AOF: {}", e);
                std::process::exit(1);
            }
        }
        Err(_) => tracing::warn!("Engine still shared at exit; skipping final AOF close"),
    }

    if served.is_err() {
        std::process::exit(1);
    }
    tracing::info!("Server stopped");
}
