//! Dispatch CLI
//!
//! Submits GPU batch jobs to LSF, one per dataset, from a Lua job definition.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::{Backend, Config};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dispatch")]
#[command(about = "Submit per-dataset GPU jobs to an LSF cluster", long_about = None)]
struct Cli {
    /// Lua job definition file
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "DISPATCH_DEFINITION",
        default_value = "jobs.lua"
    )]
    definition: PathBuf,

    /// Where jobs are sent
    #[arg(
        long,
        short = 'b',
        global = true,
        env = "DISPATCH_BACKEND",
        value_enum,
        default_value_t = Backend::Lsf
    )]
    backend: Backend,

    /// Path of the bsub executable
    #[arg(long, global = true, env = "DISPATCH_BSUB", default_value = "bsub")]
    bsub: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dispatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        definition: cli.definition,
        backend: cli.backend,
        bsub: cli.bsub,
    };
    config.validate()?;

    handle_command(cli.command, &config).await
}
