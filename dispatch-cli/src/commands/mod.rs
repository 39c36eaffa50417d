//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod init;
mod script;
mod show;
mod submit;

use anyhow::Result;
use clap::Subcommand;
use dispatch_core::domain::JobTemplate;
use std::path::PathBuf;
use tracing::warn;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit one job per dataset
    Submit {
        /// Dataset to submit (repeatable); defaults to every listed dataset
        #[arg(long)]
        dataset: Vec<String>,
    },
    /// Render the #BSUB script for one dataset
    Script {
        /// Dataset the job runs on
        #[arg(long)]
        dataset: String,

        /// Write the script to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the expanded job specs
    Show {
        /// Only show the job for this dataset
        #[arg(long)]
        dataset: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a starter job definition
    Init {
        /// Definition file to create
        #[arg(short, long, default_value = "jobs.lua")]
        output: PathBuf,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Submit { dataset } => submit::handle_submit(&dataset, config).await,
        Commands::Script { dataset, output } => {
            script::handle_script(&dataset, output.as_deref(), config)
        }
        Commands::Show { dataset, json } => show::handle_show(dataset.as_deref(), json, config),
        Commands::Init { output, force } => init::handle_init(&output, force),
    }
}

/// Datasets outside the definition are still submitted; the program decides
/// whether it knows them.
fn warn_if_unlisted(template: &JobTemplate, dataset: &str) {
    if !template.lists(dataset) {
        warn!(
            "Dataset '{}' is not listed in the job definition, submitting it anyway",
            dataset
        );
    }
}
