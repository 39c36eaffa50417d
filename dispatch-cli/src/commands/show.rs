//! Show command handler
//!
//! Prints the job specs a definition expands to without submitting anything.

use anyhow::Result;
use colored::*;
use dispatch_core::domain::JobSpec;
use dispatch_core::render::shell_join;

use super::warn_if_unlisted;
use crate::config::Config;

/// Handle `dispatch show`
pub fn handle_show(dataset: Option<&str>, json: bool, config: &Config) -> Result<()> {
    let template = config.load_template()?;

    let specs = match dataset {
        Some(dataset) => {
            warn_if_unlisted(&template, dataset);
            vec![template.spec_for(dataset)?]
        }
        None => template.expand()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    if specs.is_empty() {
        println!("{}", "No datasets listed in the job definition.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("{} job(s) from {}:", specs.len(), config.definition.display()).bold()
    );
    println!();
    for spec in &specs {
        print_spec(spec);
        println!();
    }

    Ok(())
}

fn print_spec(spec: &JobSpec) {
    println!("  {} {}", "▸".cyan(), spec.dataset.bold());
    println!("    Job name:   {}", spec.job_name);
    println!("    Queue:      {}", spec.queue);
    println!("    GPU:        {}", spec.gpu);
    println!("    Wall clock: {}", spec.wall_clock);
    println!("    Log:        {}", spec.output_log.to_string().cyan());
    if let Some(image) = &spec.container_image {
        println!("    Image:      {}", image);
    }
    if spec.notify {
        println!("    Notify:     {}", "yes".green());
    }
    println!("    Command:    {}", shell_join(&spec.command()).dimmed());
}
