//! Script command handler
//!
//! Renders the `#BSUB` batch script for one dataset, for sites that submit
//! with `bsub < script.sh` or keep scripts under version control.

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::Path;

use super::warn_if_unlisted;
use crate::config::Config;

/// Handle `dispatch script`
pub fn handle_script(dataset: &str, output: Option<&Path>, config: &Config) -> Result<()> {
    let template = config.load_template()?;
    warn_if_unlisted(&template, dataset);

    let script = template.spec_for(dataset)?.to_script();

    match output {
        Some(path) => {
            fs::write(path, &script)
                .with_context(|| format!("Failed to write script to {}", path.display()))?;
            println!("  {} {}", "Created".green(), path.display());
        }
        None => print!("{}", script),
    }

    Ok(())
}
