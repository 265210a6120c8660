use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use prime_scraper_lib::infrastructure::logging;
use prime_scraper_lib::{ConfigLoader, ScrapeService, server};

#[derive(Debug, Parser)]
#[command(name = "prime-scraper", version, about = "Scrape item detail pages into JSON records")]
struct Cli {
    /// Config file (JSON, TOML or YAML); defaults to the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    host: Option<String>,

    #[arg(long, global = true)]
    port: Option<u16>,

    /// error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,

    /// Scrape a single item and print its record as JSON
    Scrape { item_id: String },
}

fn load_config(cli: &Cli) -> Result<prime_scraper_lib::AppConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = cli.config.clone().or_else(ConfigLoader::default_config_path) {
        loader = loader.with_file(path);
    }
    if let Some(host) = &cli.host {
        loader = loader.with_override("server.host", host);
    }
    if let Some(port) = cli.port {
        loader = loader.with_override("server.port", port);
    }
    if let Some(level) = &cli.log_level {
        loader = loader.with_override("logging.level", level);
    }
    loader.load().context("Failed to load configuration")
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = logging::with_bootstrap_logging(|| load_config(&cli))?;
    logging::init_logging_with_config(&config.logging)?;

    let service = ScrapeService::new(config.scraper.clone())?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            server::serve(&config.server, service).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Scrape { item_id } => match service.scrape(&item_id).await {
            Ok(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                error!("Scrape of {} failed ({}): {}", item_id, e.kind().as_str(), e);
                Ok(ExitCode::FAILURE)
            }
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => {
            info!("Exiting");
            code
        }
        Err(e) => {
            eprintln!("prime-scraper: {e:#}");
            ExitCode::FAILURE
        }
    }
}
