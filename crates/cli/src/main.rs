use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cotacao_api::{QuoteServer, ServerConfig};
use cotacao_core::Settings;
use cotacao_data::{AwesomeApiFetcher, SqliteQuoteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "cotacao")]
#[command(about = "USD-BRL quote server and client")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// TOML settings file
    #[arg(short, long, env = "COTACAO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the current bid on /cotacao, storing every fetched quote
    Server {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Ask the server for the current bid and write it to a file
    Client {
        /// Quote server endpoint
        #[arg(short, long)]
        url: Option<String>,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Server { port, database } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(database) = database {
                settings.database.path = database;
            }
            run_server(settings).await?;
        }
        Commands::Client { url, output } => {
            if let Some(url) = url {
                settings.client.server_url = url;
            }
            if let Some(output) = output {
                settings.client.output = output;
            }
            cotacao_client::run(&settings).await?;
        }
    }

    Ok(())
}

fn build_server(settings: &Settings) -> QuoteServer {
    let source = Arc::new(AwesomeApiFetcher::from_settings(settings));
    let repository = Arc::new(SqliteQuoteStore::from_settings(settings));
    QuoteServer::new(
        ServerConfig::from_settings(&settings.server),
        source,
        repository,
    )
}

async fn run_server(settings: Settings) -> Result<()> {
    let timeouts = settings.timeouts();
    tracing::info!(
        pair = %settings.upstream.pair,
        database = %settings.database.path.display(),
        upstream_timeout_ms = timeouts.upstream.as_millis() as u64,
        database_timeout_ms = timeouts.database.as_millis() as u64,
        "Starting quote server"
    );
    build_server(&settings).run().await
}
