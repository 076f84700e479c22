use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use riverdale::config::RiverdaleConfig;
use riverdale::http::{AppState, HttpServer, TrustedProxies};
use riverdale::ratelimit::{spawn_sweeper, EndpointRules, RateLimiter, SystemClock};
use riverdale::records::MemoryStore;

/// Log output format.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "riverdale")]
#[command(about = "Rate-limited submission endpoints for the Riverdale travel site")]
#[command(version)]
struct Args {
    /// Service configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint rate limit rules file (YAML), overrides the config file
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// HTTP listen address, overrides the config file
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match args.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_thread_ids(true)
            .init(),
    }

    info!("Starting Riverdale");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = RiverdaleConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.http_addr = listen;
    }
    info!(
        http_addr = %config.server.http_addr,
        trusted_proxies = ?config.server.trusted_proxies,
        "Configuration loaded"
    );

    let rules_path = args
        .rules
        .or_else(|| config.rate_limiting.rules_path.as_ref().map(PathBuf::from));
    let rules = match rules_path {
        Some(path) => EndpointRules::from_file(path)?,
        None => {
            info!("No rules file given, using built-in endpoint quotas");
            EndpointRules::default()
        }
    };

    let limiter = Arc::new(match config.rate_limiting.max_entries {
        Some(capacity) => RateLimiter::with_capacity_limit(SystemClock, capacity)?,
        None => RateLimiter::new(),
    });
    info!(
        max_entries = ?config.rate_limiting.max_entries,
        "Rate limiter initialized"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_sweeper(
        limiter.clone(),
        Duration::from_secs(config.rate_limiting.sweep_interval_secs),
        config.rate_limiting.sweep_grace_ms,
        shutdown_rx,
    );

    let state = AppState {
        limiter,
        store: Arc::new(MemoryStore::new()),
        rules: Arc::new(rules),
        admin_email: config.notifications.admin_email.clone(),
        trusted_proxies: TrustedProxies::new(config.server.trusted_proxies.iter().copied()),
    };

    // Run the server with graceful shutdown on Ctrl+C
    HttpServer::new(config.server.http_addr, state)
        .serve_with_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    sweeper.await?;

    info!("Riverdale stopped");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
