//! Monto host daemon (montod)
//!
//! Hosts the product store for a live editing session: producers connect
//! over TCP or WebSocket and publish products; the store signals content
//! changes to whatever view layer is attached.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (TCP on 7350, WebSocket on 7351)
//! montod
//!
//! # Custom ports
//! montod --port 8000 --ws-port 8001
//!
//! # Forward opaque settings to producers
//! montod --settings /etc/monto/settings.toml
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use monto_core::ProductStore;
use monto_transport::{ProducerListener, WsProducerListener};

/// Monto host daemon - source <-> product cross-navigation host
#[derive(Parser, Debug)]
#[command(name = "montod")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TCP port to listen on
    #[arg(long, env = "MONTO_PORT", default_value = "7350")]
    port: u16,

    /// WebSocket port to listen on
    #[arg(long, env = "MONTO_WS_PORT", default_value = "7351")]
    ws_port: u16,

    /// Bind address (producers are expected to be editor-local)
    #[arg(long, env = "MONTO_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// TOML settings file forwarded verbatim to producers
    #[arg(long, env = "MONTO_SETTINGS")]
    settings: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "MONTO_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Disable the TCP listener
    #[arg(long)]
    no_tcp: bool,

    /// Disable the WebSocket listener
    #[arg(long)]
    no_ws: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    print_banner();

    // Shared product store
    let store = Arc::new(ProductStore::new());

    // Load settings and seed the configuration fan-out; the settings
    // object is opaque and forwarded without validation.
    let initial_settings = match &args.settings {
        Some(path) => match load_settings(path) {
            Ok(settings) => {
                info!(path = %path.display(), "Settings loaded");
                Some(settings)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load settings, starting without");
                None
            }
        },
        None => None,
    };
    let (_config_tx, config_rx) = watch::channel(initial_settings);

    info!(
        port = args.port,
        ws_port = args.ws_port,
        bind = %args.bind,
        "Starting monto host"
    );

    let mut handles = Vec::new();

    if !args.no_tcp {
        let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
        let listener = ProducerListener::new(store.clone(), addr, config_rx.clone());
        handles.push(tokio::spawn(async move {
            if let Err(e) = listener.run().await {
                tracing::error!(error = %e, "TCP listener error");
            }
        }));
    }

    if !args.no_ws {
        let addr: SocketAddr = format!("{}:{}", args.bind, args.ws_port).parse()?;
        let listener = WsProducerListener::new(store.clone(), addr, config_rx.clone());
        handles.push(tokio::spawn(async move {
            if let Err(e) = listener.run().await {
                tracing::error!(error = %e, "WebSocket listener error");
            }
        }));
    }

    if handles.is_empty() {
        anyhow::bail!("At least one transport must be enabled");
    }

    // Log content-change signals so a session is observable without a
    // view layer attached.
    let signal_store = store.clone();
    handles.push(tokio::spawn(async move {
        let mut rx = signal_store.subscribe();
        while let Ok(signal) = rx.recv().await {
            info!(
                identity = %signal.identity,
                redisplay = signal.redisplay,
                "Content changed"
            );
        }
    }));

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    Ok(())
}

/// Parse a TOML settings file into the opaque JSON object forwarded to
/// producers.
fn load_settings(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)?;
    let settings: serde_json::Value = toml::from_str(&text)?;
    Ok(settings)
}

fn print_banner() {
    println!(
        r#"
  ╔╦╗╔═╗╔╗╔╔╦╗╔═╗
  ║║║║ ║║║║ ║ ║ ║
  ╩ ╩╚═╝╝╚╝ ╩ ╚═╝
  Source <-> Product Navigation Host
  Version {}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
