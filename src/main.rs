//! NLP gateway - forwards text-analysis requests to upstream NLP services and persists records

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nlp_gateway::api::{self, AppState};
use nlp_gateway::config::Config;
use nlp_gateway::upstream::Upstream;

#[derive(Parser)]
#[command(name = "nlp-gateway")]
#[command(about = "HTTP gateway in front of the NLP microservices")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (environment variables still take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Interface to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the registered routes and exit
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("nlp_gateway={},tower_http=debug", log_level).into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await?;
        }

        Commands::Routes => {
            for route in api::registered_routes() {
                println!("{:<6} {:<16} {}", route.method, route.path, route.name);
            }
        }
    }

    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    for upstream in Upstream::ALL {
        tracing::info!(
            "Upstream {} -> {}",
            upstream.name(),
            state.upstreams.base_url(upstream)
        );
    }
    tracing::info!("Records stored in {}", config.record_db.display());
    if config.api_key.is_none() {
        tracing::warn!("API_KEY not set, gateway accepts unauthenticated requests");
    }

    let router = api::create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting HTTP server on {}", addr);

    println!("NLP gateway running at http://{}", addr);
    println!("  Health: http://{}/health", addr);
    println!("  Routes: http://{}/routes", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
