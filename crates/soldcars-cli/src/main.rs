//! soldcars CLI
//!
//! HTTP service and operator tools for soldcars.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use soldcars_core::store::{CarStore, ConnectionRegistry, StoreError};
use soldcars_core::Config;

mod commands;
mod output;
mod server;

use output::{Output, OutputFormat};

/// Log filter override
const LOG_ENV: &str = "SOLDCARS_LOG";

#[derive(Parser)]
#[command(name = "soldcars")]
#[command(about = "soldcars - sold car records on a replicated store")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        listen: Option<String>,
    },
    /// Insert mock cars with consecutive serial numbers
    Fake {
        /// Number of cars
        count: u32,
        /// First serial number
        start: u32,
    },
    /// Send a mock car to a running service
    Fakesend {
        /// Car serial number
        serial: u32,
        /// Service host[:port]
        #[arg(long, default_value = "balancer")]
        host: String,
    },
    /// List stored cars
    #[command(alias = "ls")]
    List {
        /// Maximum number of cars
        #[arg(short, long)]
        limit: Option<i64>,
    },
    /// Show a single car
    Show {
        /// Car serial number
        serial: u32,
        /// Allow reading from a secondary
        #[arg(long)]
        stale_ok: bool,
    },
    /// Drop the car collection
    Drop,
    /// Create the unique serial number index
    Index,
    /// Initiate the replica set and wait until it converges
    Replica,
    /// Show configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    init_logging(&cli.command);

    let result = run(cli.command, &output).await;
    if let Some(hint) = result.as_ref().err().and_then(recovery_hint) {
        eprintln!("Hint: {}", hint);
    }
    result
}

async fn run(command: Commands, output: &Output) -> Result<()> {
    // Commands that don't need the store
    match &command {
        Commands::Config { command } => return handle_config_command(command.clone(), output),
        Commands::Fakesend { serial, host } => {
            return commands::fake::fakesend(host, *serial, output).await
        }
        _ => {}
    }

    let config = Config::load()?;
    match command {
        Commands::Serve { listen } => server::serve(&config, listen).await,
        Commands::Replica => commands::replica::replica(&config, output).await,
        command => handle_store_command(command, &config, output).await,
    }
}

/// Recovery advice for the first store error in the cause chain
fn recovery_hint(error: &anyhow::Error) -> Option<&'static str> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<StoreError>())
        .and_then(StoreError::recovery_suggestion)
}

/// Run a one-shot command against the car collection
async fn handle_store_command(command: Commands, config: &Config, output: &Output) -> Result<()> {
    let registry = Arc::new(ConnectionRegistry::new(config.store_settings()));
    let store = CarStore::new(Arc::clone(&registry));

    let result = match command {
        Commands::Fake { count, start } => commands::fake::fake(&store, count, start, output).await,
        Commands::List { limit } => commands::cars::list(&store, limit, output).await,
        Commands::Show { serial, stale_ok } => {
            commands::cars::show(&store, serial, stale_ok, output).await
        }
        Commands::Drop => commands::cars::drop_collection(&store, output).await,
        Commands::Index => commands::cars::index(&store, output).await,
        _ => unreachable!("handled in main"),
    };

    registry.close_all().await;
    result
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
    }
}

/// Log to stderr, verbose for the service and errors-only for tools
fn init_logging(command: &Commands) {
    let default_level = match command {
        Commands::Serve { .. } => "debug",
        _ => "error",
    };
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
