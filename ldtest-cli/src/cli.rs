//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load test one URL or every URL of a CSV file
    Load(LoadArgs),

    /// Start the load test service
    Serve,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// URL to load test
    #[arg(long, value_name = "URL", conflicts_with = "csv", required_unless_present = "csv")]
    pub url: Option<String>,

    /// CSV file whose first column holds the URLs to test
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// HTTP method used for every request (overrides the configuration)
    #[arg(long, value_name = "METHOD")]
    pub method: Option<String>,

    /// Stop the whole run after this many seconds and report what was measured
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub duration: Option<u64>,

    /// Roll the report up per host
    #[arg(long)]
    pub group_by_host: bool,

    /// Hide the per-target progress bars
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format: yaml, json
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_requires_a_source() {
        assert!(Cli::try_parse_from(["ldtest", "load"]).is_err());
        assert!(Cli::try_parse_from([
            "ldtest", "load", "--url", "http://a.test/", "--csv", "urls.csv"
        ])
        .is_err());
    }

    #[test]
    fn test_load_arguments() {
        let cli = Cli::try_parse_from([
            "ldtest",
            "--log-level",
            "debug",
            "load",
            "--url",
            "http://a.test/",
            "--method",
            "post",
            "--duration",
            "30",
            "--group-by-host",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Some(Commands::Load(args)) = cli.command else {
            panic!("expected the load command");
        };
        assert_eq!(args.url.as_deref(), Some("http://a.test/"));
        assert_eq!(args.method.as_deref(), Some("post"));
        assert_eq!(args.duration, Some(30));
        assert!(args.group_by_host);
        assert!(!args.no_progress);
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        assert!(Cli::try_parse_from([
            "ldtest", "load", "--url", "http://a.test/", "--duration", "0"
        ])
        .is_err());
    }
}
