//! # bagsmith CLI entry point
//!
//! Parses command-line arguments, installs logging, loads configuration and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bagsmith_cli::bag::{run_bag, BagArgs};
use bagsmith_cli::config::AppConfig;
use bagsmith_cli::exit_codes;
use bagsmith_cli::registry::{run_registry, RegistryArgs};
use bagsmith_cli::s3::{run_s3download, S3DownloadArgs};

/// Create BagIt bags with pre-flight profile validation, query the
/// preservation registry, and download from S3-compatible storage.
#[derive(Parser, Debug)]
#[command(name = "bagsmith", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to an env-style configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create bags.
    Bag(BagArgs),

    /// Query the registry member API.
    Registry(RegistryArgs),

    /// Download one object from S3-compatible storage.
    #[command(name = "s3download")]
    S3Download(S3DownloadArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "bagsmith starting");

    let result = match cli.command {
        Commands::Bag(args) => run_bag(&args),
        Commands::Registry(args) => {
            load_config(cli.config.as_deref()).and_then(|config| run_registry(&args, &config))
        }
        Commands::S3Download(args) => {
            load_config(cli.config.as_deref()).and_then(|config| run_s3download(&args, &config))
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(exit_codes::RUNTIME_ERROR)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AppConfig> {
    Ok(AppConfig::load(path)?)
}
