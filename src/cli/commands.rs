//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "guardianly")]
#[command(about = "Guardianly hazard-alerting backend: playbook ingestion and safety recommendations")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (default: from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (default: from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable CORS
        #[arg(long)]
        cors: bool,
    },
    /// Ingest playbook files from a directory into the vector index
    Ingest {
        /// Directory containing playbook files
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Filename pattern, `*` matches anything (default: from config)
        #[arg(long)]
        pattern: Option<String>,
        /// Print the ingest report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a recommendation for a hazard at a location
    Recommend {
        /// Hazard name, e.g. "Road Closure"
        #[arg(long)]
        hazard: String,
        /// User latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// User longitude
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// List the canonical hazard set
    Hazards,
    /// Show current configuration
    Config,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_recommend_with_negative_longitude() {
        let cli = Cli::parse_from([
            "guardianly",
            "recommend",
            "--hazard",
            "Road Closure",
            "--lat",
            "44.95",
            "--lng",
            "-123.03",
        ]);
        match cli.command {
            Commands::Recommend { hazard, lat, lng } => {
                assert_eq!(hazard, "Road Closure");
                assert!((lat - 44.95).abs() < f64::EPSILON);
                assert!((lng + 123.03).abs() < f64::EPSILON);
            }
            _ => panic!("expected recommend"),
        }
    }

    #[test]
    fn test_parse_ingest_defaults() {
        let cli = Cli::parse_from(["guardianly", "ingest"]);
        match cli.command {
            Commands::Ingest { dir, pattern, json } => {
                assert_eq!(dir, PathBuf::from("."));
                assert!(pattern.is_none());
                assert!(!json);
            }
            _ => panic!("expected ingest"),
        }
    }
}
