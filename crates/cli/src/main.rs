//! pulsecheck CLI - runs database health probes from a probe file

mod logging;
mod output;
mod settings;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use pulsecheck_core::application::tag_predicate;
use pulsecheck_core::domain::HealthStatus;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pulsecheck")]
#[command(about = "Database health probes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Probe file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "PULSECHECK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured probes and print a report
    Check {
        /// Only run checks carrying one of these tags
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Exit successfully when the report is Degraded
        #[arg(long)]
        allow_degraded: bool,
    },

    /// List the configured checks without running them
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

/// Exit status contract: only Healthy passes, unless Degraded is allowed
fn passes(status: HealthStatus, allow_degraded: bool) -> bool {
    match status {
        HealthStatus::Healthy => true,
        HealthStatus::Degraded => allow_degraded,
        HealthStatus::Unhealthy => false,
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init()?;
    info!(version = pulsecheck_core::VERSION, "pulsecheck starting");

    let path = cli.config.unwrap_or_else(settings::default_path);
    let probe_file = settings::load(&path)?;
    info!(path = %path.display(), probes = probe_file.probes.len(), "Probe file loaded");

    let service = probe_file
        .into_builder()?
        .build()
        .context("Invalid health check registration")?;

    match cli.command {
        Commands::Check {
            tags,
            format,
            allow_degraded,
        } => {
            let cancel = CancellationToken::new();
            let interrupt = {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupted, cancelling probes");
                        cancel.cancel();
                    }
                })
            };

            let report = service
                .check_health_filtered(tag_predicate(&tags), &cancel)
                .await;
            interrupt.abort();

            if report.entries.is_empty() {
                eprintln!("{}", "No checks matched".yellow());
            }

            match format {
                Format::Table => {
                    println!("{}", output::report_table(&report));
                    println!("{}", output::summary(&report));
                }
                Format::Json => println!("{}", output::report_json(&report)?),
            }

            Ok(if passes(report.status, allow_degraded) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::List => {
            println!("{}", "Registered checks".cyan().bold());
            println!("{}", output::registrations_table(service.registrations()));
            Ok(ExitCode::SUCCESS)
        }
    }
}
