//! Command-line host for agent-factory workflows.

mod commands;

use agent_factory_canvas::{CanvasError, FactoryConfig};
use clap::{Parser, Subcommand};
use rootcause::Report;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Inspect agent-factory workflow documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file; `AGENT_FACTORY__*` variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the node types available on the canvas
    Palette,
    /// Import a workflow document, re-validate it and print a summary
    Inspect {
        /// Path to the workflow JSON file
        path: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(report) => {
            tracing::error!(error = %report.current_context(), "command failed");
            eprintln!("{report}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, Report<CanvasError>> {
    match cli.command {
        Command::Palette => Ok(commands::palette()),
        Command::Inspect { path, json } => {
            let config = FactoryConfig::load(cli.config.as_deref())?;
            tracing::info!(path = %path.display(), "inspecting workflow");
            let inspection = commands::inspect(&path, &config)?;
            if json {
                let mut out = commands::render_json(&inspection)?;
                out.push('\n');
                Ok(out)
            } else {
                Ok(commands::render(&inspection))
            }
        }
    }
}
