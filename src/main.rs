//! Telegram Check View entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use telegram_check_view::api::{create_router, AppState};
use telegram_check_view::config::Config;
use telegram_check_view::error::AppError;
use telegram_check_view::metrics;
use telegram_check_view::stats::{fetch_message_stats, StatsQuery, StatsRequest, StatsResponse};
use telegram_check_view::telegram::{SessionManager, TelegramConnector};
use telegram_check_view::utils::shutdown_signal;

/// Telegram message views and reactions API.
#[derive(Parser, Debug)]
#[command(name = "telegram-check-view")]
#[command(about = "HTTP API reporting view and reaction counts of Telegram messages")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Fetch the stats of one message and print them as JSON.
    Stats {
        /// Peer of the message.
        #[arg(long)]
        peer: String,

        /// ID of the message.
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("telegram_check_view=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Stats { peer, id }) => cmd_stats(peer, id).await,
        None => cmd_serve(args.port).await,
    }
}

/// Load and validate configuration, logging failures.
fn load_config() -> telegram_check_view::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(AppError::InvalidConfig(e));
    }

    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TELEGRAM CHECK VIEW - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Decoding session string... ");
    match telegram_check_view::telegram::client::decode_session(&config.stringsession) {
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Session string invalid"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  API ID: {}", config.apiid);
    println!("  API Hash: {}", config.redacted_api_hash());
    println!("  Port: {}", config.port);
    println!(
        "  Metrics: {}",
        if config.metrics_enabled {
            format!("Enabled (port {})", config.metrics_port)
        } else {
            "Disabled".to_string()
        }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Fetch the stats of one message and print them.
async fn cmd_stats(peer: String, id: String) -> anyhow::Result<()> {
    let config = load_config()?;

    let request = StatsRequest::try_from(StatsQuery {
        peer: Some(peer),
        id: Some(id),
    })?;

    let stats = query_once(&config, &request).await?;

    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

/// Connect a throwaway session and fetch one message's stats.
async fn query_once(
    config: &Config,
    request: &StatsRequest,
) -> telegram_check_view::Result<StatsResponse> {
    let sessions = SessionManager::new(Arc::new(TelegramConnector::new(config)));
    let api = sessions.ensure_session().await?;

    Ok(fetch_message_stats(api.as_ref(), request).await?)
}

/// Run the HTTP server.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let mut config = load_config()?;

    if let Some(port) = port_override {
        config.port = port;
    }

    info!(?config, "Configuration loaded successfully");

    if config.metrics_enabled {
        metrics::install_exporter(config.metrics_port)?;
        info!("Prometheus exporter listening on port {}", config.metrics_port);
    }

    // The session lives for the whole process and is shared by every request
    let sessions = Arc::new(SessionManager::new(Arc::new(TelegramConnector::new(
        &config,
    ))));
    let app_state = AppState::new(Arc::clone(&sessions));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    // Connect eagerly so the first request does not pay for it
    let startup_sessions = Arc::clone(&sessions);
    tokio::spawn(async move {
        if let Err(e) = startup_sessions.ensure_session().await {
            warn!(error = %e, "Startup connect failed, will retry on next request");
        }
    });

    let router = create_router(app_state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");

    Ok(())
}
