//! VPS Terminal Dashboard
//!
//! Serves simulated SSH terminals over HTTP and forwards real
//! connectivity checks to the SSH test backend.

mod backend;
mod session;
mod web_ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vpsterm_core::{SessionTiming, CLOSE_DELAY_MS, CONNECT_DELAY_MS};

use crate::backend::{SshBackend, DEFAULT_TIMEOUT_SECS};
use crate::session::SessionManager;

/// VPS Terminal Dashboard - simulated SSH sessions for the VPS manager
#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(author = "VPS Terminal Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Web dashboard for simulated VPS terminals", long_about = None)]
struct Args {
    /// Bind address for the web server
    #[arg(short, long, default_value = "127.0.0.1:3721")]
    bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Base URL of the SSH test backend
    #[arg(long, env = "SSH_BACKEND_URL", default_value = "http://127.0.0.1:8000")]
    ssh_backend_url: String,

    /// Timeout for SSH backend requests, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    ssh_timeout_secs: u64,

    /// Simulated handshake time, in milliseconds
    #[arg(long, default_value_t = CONNECT_DELAY_MS)]
    connect_delay_ms: u64,

    /// Delay before a closed terminal is released, in milliseconds
    #[arg(long, default_value_t = CLOSE_DELAY_MS)]
    close_delay_ms: u64,

    /// Maximum number of open terminals
    #[arg(long, default_value_t = 16)]
    max_sessions: usize,

    /// Disable browser auto-open
    #[arg(long, default_value = "false")]
    no_browser: bool,
}

impl Args {
    fn timing(&self) -> SessionTiming {
        SessionTiming {
            connect_delay: Duration::from_millis(self.connect_delay_ms),
            close_delay: Duration::from_millis(self.close_delay_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level)?;

    info!("Starting VPS Terminal Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let bind_addr: SocketAddr = args
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", args.bind))?;

    let sessions = Arc::new(SessionManager::new(args.timing(), args.max_sessions));
    let backend = Arc::new(
        SshBackend::new(
            &args.ssh_backend_url,
            Duration::from_secs(args.ssh_timeout_secs),
        )
        .context("Failed to create SSH backend client")?,
    );
    info!("SSH test backend: {}", backend.base_url());

    let web_server = web_ui::WebServer::new(web_ui::WebState::new(
        Arc::clone(&sessions),
        backend,
    ));
    let web_addr = web_server
        .start(bind_addr)
        .await
        .context("Failed to start web server")?;

    let url = format!("http://{}", web_addr);
    if !args.no_browser {
        if let Err(e) = web_ui::WebServer::open_browser(&url) {
            warn!("Failed to open browser: {}", e);
        }
    }

    println!("============================================");
    println!("VPS Terminal Dashboard: {}", url);
    println!("============================================");

    wait_for_shutdown().await?;

    sessions.close_all().await;
    info!("Shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() -> Result<()> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("Failed to setup SIGTERM handler")?;

    tokio::select! {
        result = signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C, shutting down...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<()> {
    signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, shutting down...");
    Ok(())
}

/// Setup logging with tracing
fn setup_logging(level: &str) -> Result<()> {
    let log_level = level.parse::<Level>().unwrap_or(Level::INFO);

    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["dashboard"]).unwrap();
        assert_eq!(args.bind, "127.0.0.1:3721");
        assert_eq!(args.ssh_timeout_secs, 20);
        assert_eq!(args.timing(), SessionTiming::default());
        assert!(!args.no_browser);
    }

    #[test]
    fn test_timing_overrides() {
        let args = Args::try_parse_from([
            "dashboard",
            "--connect-delay-ms",
            "0",
            "--close-delay-ms",
            "50",
            "--no-browser",
        ])
        .unwrap();
        assert_eq!(args.timing().connect_delay, Duration::ZERO);
        assert_eq!(args.timing().close_delay, Duration::from_millis(50));
        assert!(args.no_browser);
    }
}
