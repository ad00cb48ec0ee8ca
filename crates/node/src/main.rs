mod config;
mod service;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use service::NodeService;
use tracing::info;

#[derive(Parser)]
#[clap(name = "chain-node")]
#[clap(author, version, about = "Execution/state-management core node", long_about = None)]
struct Cli {
    /// Configuration file path
    #[clap(short, long, value_name = "FILE", default_value = "config.toml")]
    config: String,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the store and stand up the executor
    Start,

    /// Write a default configuration file
    Init {
        #[clap(short, long, default_value = "config.toml")]
        output: String,
    },

    /// Show node version
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { output }) => init_config(&output),
        Some(Commands::Version) => {
            show_version();
            Ok(())
        }
        Some(Commands::Start) | None => start_node(&cli.config),
    }
}

fn init_config(output: &str) -> Result<()> {
    Config::default().to_file(output)?;
    println!("wrote configuration to {output}");
    Ok(())
}

fn show_version() {
    println!("chain-node {}", env!("CARGO_PKG_VERSION"));
}

fn start_node(config_path: &str) -> Result<()> {
    let config = if std::path::Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    init_logging(&config)?;
    info!("starting node");

    let service = NodeService::new(config)?;
    info!(chain_id = service.config().chain.id, "node ready (no network/consensus loop — see external interfaces)");
    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
    Ok(())
}
