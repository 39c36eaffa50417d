//! Job definition parser
//!
//! Evaluates a definition file in the sandbox and converts the returned table
//! into a `JobTemplate`. The file only declares values; nothing is submitted
//! while it runs.

use anyhow::{Context, Result, anyhow};
use dispatch_core::domain::template::{DEFAULT_JOB_NAME, DEFAULT_OUTPUT_LOG, default_program};
use dispatch_core::domain::{GpuMode, GpuRequest, JobTemplate, WallClock};
use mlua::{Table, Value};
use tracing::{debug, warn};

use crate::module::ModuleRegistry;
use crate::modules::{EnvModule, JobModule, ProcessEnv, VarProvider};
use crate::sandbox::create_sandbox;

/// Top-level keys a definition may set
const KNOWN_FIELDS: &[&str] = &[
    "queue",
    "wall_clock",
    "gpu",
    "job_name",
    "output",
    "image",
    "notify",
    "program",
    "datasets",
];

/// Keys of the `gpu` table
const GPU_FIELDS: &[&str] = &["num", "mode", "gmodel"];

/// Parse a job definition, exposing the process environment through `env`
///
/// # Example
/// ```no_run
/// use dispatch_lua::parse_job_definition;
///
/// let source = r#"
///     return job.define {
///         queue = "gpu",
///         wall_clock = "48:00",
///         gpu = { num = 1, mode = "exclusive_process" },
///         datasets = { "hypothyroid", "diabetes" },
///     }
/// "#;
///
/// let template = parse_job_definition(source)?;
/// assert_eq!(template.datasets.len(), 2);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse_job_definition(source: &str) -> Result<JobTemplate> {
    parse_job_definition_with(source, ProcessEnv)
}

/// Parse a job definition with a custom variable provider for `env`
pub fn parse_job_definition_with<V: VarProvider + 'static>(
    source: &str,
    vars: V,
) -> Result<JobTemplate> {
    let modules = ModuleRegistry::new()
        .with(JobModule)
        .with(EnvModule::new(vars));

    let lua = create_sandbox(&modules).context("Failed to create definition sandbox")?;

    let definition: Table = lua
        .load(source)
        .eval()
        .context("Failed to evaluate job definition (it must return a table)")?;

    warn_unknown_fields(&definition)?;

    let queue: String = definition
        .get::<Option<String>>("queue")
        .context("Field 'queue' must be a string")?
        .ok_or_else(|| anyhow!("Job definition must have a 'queue' field"))?;

    let wall_clock = parse_wall_clock(&definition)?;
    let gpu = parse_gpu(&definition)?;

    let mut template = JobTemplate::new(queue, gpu, wall_clock);

    template.job_name = optional_string(&definition, "job_name")?
        .unwrap_or_else(|| DEFAULT_JOB_NAME.to_string());
    template.output_log = optional_string(&definition, "output")?
        .unwrap_or_else(|| DEFAULT_OUTPUT_LOG.to_string());
    template.container_image = optional_string(&definition, "image")?.filter(|s| !s.is_empty());
    template.notify = definition
        .get::<Option<bool>>("notify")
        .context("Field 'notify' must be a boolean")?
        .unwrap_or(false);
    template.program = parse_program(&definition)?;
    template.datasets = parse_datasets(&definition)?;

    debug!(
        queue = %template.queue,
        datasets = template.datasets.len(),
        "Parsed job definition"
    );

    Ok(template)
}

fn optional_string(definition: &Table, field: &str) -> Result<Option<String>> {
    definition
        .get::<Option<String>>(field)
        .with_context(|| format!("Field '{}' must be a string", field))
}

fn warn_unknown_fields(definition: &Table) -> Result<()> {
    for key in unknown_fields(definition, KNOWN_FIELDS)? {
        warn!("Ignoring unknown job definition field '{}'", key);
    }
    Ok(())
}

/// String keys of `table` that are not in `known`
fn unknown_fields(table: &Table, known: &[&str]) -> Result<Vec<String>> {
    let mut unknown = Vec::new();
    for pair in table.pairs::<Value, Value>() {
        let (key, _) = pair.context("Failed to read job definition entry")?;
        if let Value::String(key) = key {
            let key = key.to_str()?.to_string();
            if !known.contains(&key.as_str()) {
                unknown.push(key);
            }
        }
    }
    unknown.sort();
    Ok(unknown)
}

/// `wall_clock` accepts "HH:MM" or a whole number of minutes
fn parse_wall_clock(definition: &Table) -> Result<WallClock> {
    let value: Value = definition.get("wall_clock")?;

    let limit = match value {
        Value::Nil => return Err(anyhow!("Job definition must have a 'wall_clock' field")),
        Value::String(s) => {
            let text = s.to_str()?;
            let limit: WallClock = text.parse()?;
            limit
        }
        Value::Integer(minutes) => {
            let minutes = u32::try_from(minutes)
                .map_err(|_| anyhow!("Field 'wall_clock' is out of range: {}", minutes))?;
            WallClock::from_minutes(minutes)?
        }
        _ => {
            return Err(anyhow!(
                "Field 'wall_clock' must be a string (\"HH:MM\") or minutes"
            ));
        }
    };

    Ok(limit)
}

/// `gpu` is optional and defaults to one exclusive GPU of any model
fn parse_gpu(definition: &Table) -> Result<GpuRequest> {
    let value: Value = definition.get("gpu")?;

    let table = match value {
        Value::Nil => return Ok(GpuRequest::default()),
        Value::Table(table) => table,
        _ => return Err(anyhow!("Field 'gpu' must be a table")),
    };

    // A misspelled key would silently fall back to the defaults
    if let Some(key) = unknown_fields(&table, GPU_FIELDS)?.first() {
        return Err(anyhow!(
            "Unknown field 'gpu.{}' (expected num, mode or gmodel)",
            key
        ));
    }

    let num: u32 = table
        .get::<Option<u32>>("num")
        .context("Field 'gpu.num' must be a non-negative integer")?
        .unwrap_or(1);

    let mode = match table
        .get::<Option<String>>("mode")
        .context("Field 'gpu.mode' must be a string")?
    {
        Some(mode) => mode.parse::<GpuMode>()?,
        None => GpuMode::ExclusiveProcess,
    };

    let model: Option<String> = table
        .get("gmodel")
        .context("Field 'gpu.gmodel' must be a string")?;

    Ok(GpuRequest::new(num, mode, model)?)
}

/// `program` is an argv array, or a string split on whitespace
fn parse_program(definition: &Table) -> Result<Vec<String>> {
    let value: Value = definition.get("program")?;

    let program = match value {
        Value::Nil => default_program(),
        Value::String(s) => {
            let text = s.to_str()?;
            let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
            words
        }
        Value::Table(table) => {
            let mut program = Vec::new();
            for arg in table.sequence_values::<String>() {
                program.push(arg.context("Field 'program' must be an array of strings")?);
            }
            program
        }
        _ => return Err(anyhow!("Field 'program' must be a string or an array of strings")),
    };

    if program.is_empty() {
        return Err(anyhow!("Field 'program' must not be empty"));
    }

    Ok(program)
}

fn parse_datasets(definition: &Table) -> Result<Vec<String>> {
    let value: Value = definition.get("datasets")?;

    match value {
        Value::Nil => Ok(Vec::new()),
        Value::Table(table) => {
            let mut datasets = Vec::new();
            for dataset in table.sequence_values::<String>() {
                datasets.push(dataset.context("Field 'datasets' must be an array of strings")?);
            }
            Ok(datasets)
        }
        _ => Err(anyhow!("Field 'datasets' must be an array of strings")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(source: &str) -> Result<JobTemplate> {
        parse_job_definition_with(source, HashMap::<String, String>::new())
    }

    #[test]
    fn test_parse_minimal_definition() {
        let template = parse(
            r#"
            return {
                queue = "gpu",
                wall_clock = "24:00",
            }
        "#,
        )
        .unwrap();

        assert_eq!(template.queue, "gpu");
        assert_eq!(template.wall_clock.to_string(), "24:00");
        assert_eq!(template.gpu, GpuRequest::default());
        assert_eq!(template.job_name, "{dataset}");
        assert_eq!(template.output_log, "logs/{dataset}.%J.log");
        assert_eq!(template.program, vec!["python", "-m", "src.main"]);
        assert!(template.container_image.is_none());
        assert!(!template.notify);
        assert!(template.datasets.is_empty());
    }

    #[test]
    fn test_parse_full_definition() {
        let template = parse(
            r#"
            return job.define {
                queue = "gpu-a100",
                wall_clock = 90,
                gpu = { num = 2, mode = "shared", gmodel = "NVIDIAA100_SXM4_80GB" },
                job_name = "refclass_{dataset}",
                output = "/scratch/logs/{dataset}_%J.out",
                image = "pytorch/pytorch:2.1.0-cuda12.1-cudnn8-runtime",
                notify = true,
                program = { "python3", "-m", "src.main" },
                datasets = { "hypothyroid", "diabetes" },
            }
        "#,
        )
        .unwrap();

        assert_eq!(template.queue, "gpu-a100");
        assert_eq!(template.wall_clock.to_string(), "01:30");
        assert_eq!(
            template.gpu.resource_string(),
            "num=2:mode=shared:gmodel=NVIDIAA100_SXM4_80GB"
        );
        assert_eq!(template.job_name, "refclass_{dataset}");
        assert_eq!(template.output_log, "/scratch/logs/{dataset}_%J.out");
        assert_eq!(
            template.container_image.as_deref(),
            Some("pytorch/pytorch:2.1.0-cuda12.1-cudnn8-runtime")
        );
        assert!(template.notify);
        assert_eq!(template.program, vec!["python3", "-m", "src.main"]);
        assert_eq!(template.datasets, vec!["hypothyroid", "diabetes"]);

        let specs = template.expand().unwrap();
        assert_eq!(specs[1].job_name, "refclass_diabetes");
    }

    #[test]
    fn test_program_string_is_split() {
        let template = parse(
            r#"return { queue = "q", wall_clock = "1:00", program = "python  -m src.main" }"#,
        )
        .unwrap();
        assert_eq!(template.program, vec!["python", "-m", "src.main"]);
    }

    #[test]
    fn test_env_values_reach_definition() {
        let vars: HashMap<String, String> = [
            ("DISPATCH_QUEUE".to_string(), "long".to_string()),
            ("IMAGE_TAG".to_string(), "v3".to_string()),
        ]
        .into_iter()
        .collect();

        let template = parse_job_definition_with(
            r#"
            return {
                queue = env.get("DISPATCH_QUEUE", "gpu"),
                wall_clock = "12:00",
                image = "registry.example.org/refclass:" .. env.require("IMAGE_TAG"),
            }
        "#,
            vars,
        )
        .unwrap();

        assert_eq!(template.queue, "long");
        assert_eq!(
            template.container_image.as_deref(),
            Some("registry.example.org/refclass:v3")
        );
    }

    #[test]
    fn test_missing_queue() {
        let err = parse(r#"return { wall_clock = "1:00" }"#).unwrap_err();
        assert!(err.to_string().contains("queue"));
    }

    #[test]
    fn test_missing_wall_clock() {
        let err = parse(r#"return { queue = "gpu" }"#).unwrap_err();
        assert!(err.to_string().contains("wall_clock"));
    }

    #[test]
    fn test_invalid_gpu_mode() {
        let err = parse(
            r#"return { queue = "gpu", wall_clock = "1:00", gpu = { mode = "exclusive" } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown GPU mode"));
    }

    #[test]
    fn test_zero_gpus() {
        let err =
            parse(r#"return { queue = "gpu", wall_clock = "1:00", gpu = { num = 0 } }"#)
                .unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_misspelled_gpu_fields_rejected() {
        let err = parse(
            r#"return { queue = "gpu", wall_clock = "1:00", gpu = { count = 4, model = "A100" } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("gpu.count"), "{}", err);

        let err = parse(
            r#"return { queue = "gpu", wall_clock = "1:00", gpu = { num = 4, model = "A100" } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("gpu.model"), "{}", err);
    }

    #[test]
    fn test_bad_wall_clock() {
        let err = parse(r#"return { queue = "gpu", wall_clock = "1:75" }"#).unwrap_err();
        assert!(err.to_string().contains("wall-clock"));
    }

    #[test]
    fn test_invalid_lua() {
        assert!(parse("this is not valid lua!!!").is_err());
    }

    #[test]
    fn test_not_returning_table() {
        assert!(parse(r#"return "not a table""#).is_err());
    }

    #[test]
    fn test_definition_cannot_touch_filesystem() {
        let err = parse(r#"return dofile("/etc/hosts")"#).unwrap_err();
        assert!(err.to_string().contains("Failed to evaluate"));
    }
}
