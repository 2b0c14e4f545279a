pub mod commands;
pub mod config;
pub mod fixture;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use config::CliConfig;

#[derive(Debug, Parser)]
#[command(
    name = "tally",
    about = "Tally pricing CLI",
    long_about = "Calculate retail prices from a catalog fixture: tier prices, offer windows, attribute adjustments, discounts, bundles and grouped products.",
    after_help = "Examples:\n  tally catalog\n  tally price --product hoodie --quantity 3\n  tally price --product starter-bundle --currency USD --json\n  tally config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to the catalog fixture (overrides the config file)")]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Calculate the price of one product from the catalog fixture")]
    Price(commands::price::PriceArgs),
    #[command(about = "List the products in the catalog fixture")]
    Catalog {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match CliConfig::load(None) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("config validation failed: {error}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    let catalog_path = cli.catalog.unwrap_or_else(|| config.catalog.path.clone());

    let result = match cli.command {
        Command::Price(args) => commands::price::run(&config, &catalog_path, args).await,
        Command::Catalog { json } => commands::catalog::run(&catalog_path, json),
        Command::Config => Ok(commands::config::run(&config)),
    };

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &CliConfig) {
    use crate::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}
