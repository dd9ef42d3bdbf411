pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use freightrate_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "freightrate",
    about = "Freight pricing operator CLI",
    long_about = "Price parcels and freight against the rate store, manage its schema and demo data, and inspect configuration.",
    after_help = "Examples:\n  freightrate migrate\n  freightrate seed\n  freightrate quote --input request.json\n  freightrate batch --input requests.jsonl --demo --workers 8"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a freightrate.toml file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Reject requests with missing measurements")]
    strict: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo catalog into the configured database")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Price one package request read from a JSON file")]
    Quote {
        #[arg(long, help = "JSON file holding one PackageRequest")]
        input: PathBuf,
        #[arg(long, help = "Price against the built-in demo catalog instead of the database")]
        demo: bool,
    },
    #[command(about = "Price many package requests read from a JSON Lines file")]
    Batch {
        #[arg(long, help = "JSON Lines file, one PackageRequest per line")]
        input: PathBuf,
        #[arg(long, help = "Price against the built-in demo catalog instead of the database")]
        demo: bool,
        #[arg(long, help = "Concurrent pricing workers (defaults to batch.workers)")]
        workers: Option<usize>,
    },
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        let mut options =
            LoadOptions { config_path: self.config.clone(), ..LoadOptions::default() };
        if self.strict {
            options.overrides.strict_input = Some(true);
        }
        options
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    // Config errors are reported by the command itself.
    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config.logging);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::Quote { input, demo } => {
            commands::quote::run(options, commands::quote::QuoteArgs { input, demo })
        }
        Command::Batch { input, demo, workers } => {
            commands::batch::run(options, commands::batch::BatchArgs { input, demo, workers })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber. Events go to stderr so command output on
/// stdout stays machine-readable.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn batch_arguments_parse() {
        let cli = Cli::try_parse_from([
            "freightrate",
            "batch",
            "--input",
            "requests.jsonl",
            "--demo",
            "--workers",
            "8",
        ])
        .expect("parse");

        assert!(matches!(
            cli.command,
            Command::Batch { demo: true, workers: Some(8), ref input } if input.ends_with("requests.jsonl")
        ));
    }

    #[test]
    fn strict_flag_becomes_an_override() {
        let cli = Cli::try_parse_from(["freightrate", "--strict", "quote", "--input", "a.json"])
            .expect("parse");

        let options = cli.load_options();
        assert_eq!(options.overrides.strict_input, Some(true));
        assert!(options.config_path.is_none());
    }

    #[test]
    fn quote_requires_an_input_file() {
        assert!(Cli::try_parse_from(["freightrate", "quote"]).is_err());
    }
}
