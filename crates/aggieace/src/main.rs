// SPDX-FileCopyrightText: 2026 AggieAce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AggieAce - syllabus to calendar conversion.
//!
//! This is the binary entry point. It composes the cache, rate limiter,
//! job queue and converter from configuration.

mod cache;
mod convert;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use aggieace_config::AggieConfig;
use aggieace_core::HealthStatus;

use crate::convert::ConvertArgs;

/// AggieAce - convert course syllabi into calendar files.
#[derive(Parser, Debug)]
#[command(name = "aggieace", version, about, long_about = None)]
struct Cli {
    /// Configuration file to load instead of ./aggieace.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a syllabus into an .ics calendar.
    Convert(ConvertArgs),
    /// Print the content fingerprint of a document.
    Fingerprint {
        /// Document to hash.
        file: PathBuf,
    },
    /// Inspect the result cache.
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Print the cached calendar for a document, if any.
    Lookup {
        /// Document whose bytes are looked up.
        file: PathBuf,
    },
    /// Show the number of cached calendars and backend health.
    Stats,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Fingerprinting needs neither configuration nor logging.
    if let Commands::Fingerprint { file } = &cli.command {
        return match aggieace_queue::fingerprint_file(file).await {
            Ok(fingerprint) => {
                println!("{fingerprint}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("aggieace: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let config = match aggieace_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            aggieace_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.app.log_level);

    match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("aggieace: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &AggieConfig) -> Result<ExitCode, aggieace_core::AggieError> {
    match command {
        Commands::Convert(args) => {
            let shutdown = shutdown::install_signal_handler();
            let outcome = convert::run_convert(config, &args, shutdown).await?;
            let source = if outcome.from_cache { "cache" } else { "converter" };
            println!("calendar written to {} (from {source})", outcome.output.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cache {
            action: CacheCommands::Lookup { file },
        } => match cache::lookup(&config.storage, &file).await? {
            Some(entry) => {
                eprintln!("fingerprint {} cached at {}", entry.fingerprint, entry.created_at);
                print!("{}", entry.calendar_text);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("no cached calendar for {}", file.display());
                Ok(ExitCode::from(2))
            }
        },
        Commands::Cache {
            action: CacheCommands::Stats,
        } => {
            let stats = cache::stats(&config.storage).await?;
            println!("database: {}", config.storage.database_path);
            println!("entries:  {}", stats.entries);
            match stats.health {
                HealthStatus::Healthy => println!("health:   healthy"),
                HealthStatus::Degraded(reason) => println!("health:   degraded ({reason})"),
                HealthStatus::Unhealthy(reason) => println!("health:   unhealthy ({reason})"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fingerprint { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Initialize the tracing subscriber with an env filter.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("aggieace={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_flags_parse() {
        let cli = Cli::try_parse_from([
            "aggieace",
            "convert",
            "--pdf",
            "syllabus.pdf",
            "--class-name",
            "CSCE 311",
            "--section",
            "546",
            "--start-date",
            "08/25/2025",
            "--end-date",
            "12/16/2025",
            "--output",
            "out.ics",
        ])
        .unwrap();
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.pdf, PathBuf::from("syllabus.pdf"));
                assert_eq!(args.class_name, "CSCE 311");
                assert_eq!(args.section, "546");
                assert!(args.timezone.is_none());
            }
            other => panic!("expected convert, got {other:?}"),
        }
    }

    #[test]
    fn convert_requires_output() {
        let result = Cli::try_parse_from([
            "aggieace",
            "convert",
            "--pdf",
            "syllabus.pdf",
            "--class-name",
            "CSCE 311",
            "--section",
            "546",
            "--start-date",
            "08/25/2025",
            "--end-date",
            "12/16/2025",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["aggieace", "cache", "stats", "--config", "alt.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(
            cli.command,
            Commands::Cache {
                action: CacheCommands::Stats
            }
        ));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = aggieace_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.rate_limit.max_calls_per_day, 100);
        assert_eq!(config.rate_limit.max_calls_per_minute, 5);
    }
}
