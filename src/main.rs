use clap::Parser;
use guardianly::cli::handle_config_command;
use guardianly::cli::handle_hazards_command;
use guardianly::cli::handle_ingest;
use guardianly::cli::handle_recommend;
use guardianly::cli::handle_serve_api;
use guardianly::cli::Cli;
use guardianly::cli::Commands;
use guardianly::config::AppConfig;
use guardianly::Result;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hazard listing needs no configuration
    if matches!(cli.command, Commands::Hazards) {
        if cli.verbose {
            guardianly::logging::init_logging_with_level("debug")?;
        } else {
            guardianly::logging::init_logging()?;
        }
        return handle_hazards_command();
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    if cli.verbose {
        guardianly::logging::init_logging_with_level("debug")?;
    } else {
        guardianly::logging::init_logging_with_config(Some(&config))?;
    }
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve_api(&config, host, port, cors).await?;
        }
        Commands::Ingest { dir, pattern, json } => {
            handle_ingest(&config, &dir, pattern, json).await?;
        }
        Commands::Recommend { hazard, lat, lng } => {
            handle_recommend(&config, hazard, lat, lng).await?;
        }
        Commands::Hazards => {
            handle_hazards_command()?;
        }
        Commands::Config => {
            handle_config_command(&config)?;
        }
    }

    Ok(())
}
