//! The `lingua` binary inspects and validates provider-chain registries.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lingua::config::CHAINS_ENV_VAR;
use lingua_cli::{check, load_registry, render_summaries, summarize};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Chain registry file (defaults to <config dir>/lingua/chains.json)
    #[arg(long, global = true, env = CHAINS_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validates the registry (default)
    Check {
        /// Treat chains without a schema as problems
        #[arg(long)]
        require_schema: bool,
    },
    /// Lists every chain in fallback order
    Show {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let (path, registry) = load_registry(cli.config)?;
    tracing::debug!(path = %path.display(), chains = registry.len(), "Loaded registry");

    match cli.command.unwrap_or(Commands::Check {
        require_schema: false,
    }) {
        Commands::Check { require_schema } => {
            let report = check(&registry, require_schema);
            for problem in &report.problems {
                tracing::warn!("{problem}");
            }
            if !report.is_clean() {
                return Ok(ExitCode::FAILURE);
            }
            println!("{}: {} chains OK", path.display(), report.features);
        }
        Commands::Show { json } => {
            let summaries = summarize(&registry);
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                print!("{}", render_summaries(&path, &summaries));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
