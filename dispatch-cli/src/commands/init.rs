//! Init command handler
//!
//! Writes a starter job definition next to a `.luarc.json` and LuaLS stubs,
//! so editors can complete the `job` and `env` globals.

use anyhow::{Context, Result, bail};
use colored::*;
use dispatch_lua::stub_modules;
use std::fs;
use std::path::Path;

/// Directory, relative to the definition, holding generated stubs
const STUBS_DIR: &str = ".dispatch/stubs";

/// Starter definition: one GPU job per dataset
const STARTER_DEFINITION: &str = r#"-- Job definition for `dispatch submit`
--
-- `{dataset}` in job_name and output is replaced per dataset.
-- `%J` is left for LSF to fill in with the job id.

return job.define {
    queue = env.get("DISPATCH_QUEUE", "gpu"),
    gpu = { num = 1, mode = "exclusive_process" },
    wall_clock = "48:00",

    job_name = "{dataset}",
    output = "logs/{dataset}.%J.log",

    image = env.get("DISPATCH_IMAGE", "pytorch/pytorch:latest"),
    notify = true,

    program = { "python", "-m", "src.main" },
    datasets = { "hypothyroid", "diabetes" },
}
"#;

/// Handle `dispatch init`
pub fn handle_init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    fs::write(output, STARTER_DEFINITION)
        .with_context(|| format!("Failed to write job definition to {}", output.display()))?;
    println!("  {} {}", "Created".green(), output.display());

    generate_luarc_json(dir)?;
    generate_stub_files(dir)?;

    println!();
    println!("{}", "✓ Job definition ready!".green().bold());
    println!();
    println!("{}", "Next steps:".bold());
    println!("  1. Adjust the queue, GPU request and image for your cluster");
    println!(
        "  2. Preview the jobs with {}",
        format!("dispatch --definition {} show", output.display()).cyan()
    );
    println!(
        "  3. Submit them with {}",
        format!("dispatch --definition {} submit", output.display()).cyan()
    );

    Ok(())
}

/// Generate .luarc.json for Lua LSP configuration
fn generate_luarc_json(dir: &Path) -> Result<()> {
    let luarc_path = dir.join(".luarc.json");

    let luarc_content = format!(
        r#"{{
  "$schema": "https://raw.githubusercontent.com/sumneko/vscode-lua/master/setting/schema.json",
  "runtime": {{
    "version": "Lua 5.4"
  }},
  "diagnostics": {{
    "globals": ["job", "env"]
  }},
  "workspace": {{
    "library": ["{}"],
    "checkThirdParty": false
  }}
}}
"#,
        STUBS_DIR
    );

    fs::write(&luarc_path, luarc_content)
        .with_context(|| format!("Failed to write {}", luarc_path.display()))?;

    println!("  {} .luarc.json", "Created".green());

    Ok(())
}

/// Stubs come from the modules themselves so they cannot drift
fn generate_stub_files(dir: &Path) -> Result<()> {
    let stubs_dir = dir.join(STUBS_DIR);
    fs::create_dir_all(&stubs_dir)
        .with_context(|| format!("Failed to create stubs directory at {}", stubs_dir.display()))?;

    for module in stub_modules().modules() {
        let stub_path = stubs_dir.join(format!("{}.lua", module.id()));

        fs::write(&stub_path, module.stubs())
            .with_context(|| format!("Failed to write stub file {}", stub_path.display()))?;

        println!("  {} {}.lua", "Created".green(), module.id());
    }

    Ok(())
}
