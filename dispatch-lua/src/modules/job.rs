//! `job` module for definition files
//!
//! `job.define { ... }` returns its table unchanged. It exists so definitions
//! read as declarations and so editors can attach the `JobDefinition` type
//! from the stubs.

use crate::module::DefinitionModule;
use mlua::prelude::*;

pub struct JobModule;

impl DefinitionModule for JobModule {
    fn id(&self) -> &'static str {
        "job"
    }

    fn register(&self, lua: &Lua) -> LuaResult<()> {
        let job = lua.create_table()?;

        job.set(
            "define",
            lua.create_function(|_, definition: LuaTable| Ok(definition))?,
        )?;

        lua.globals().set(self.id(), job)?;
        Ok(())
    }

    fn stubs(&self) -> String {
        r#"---@meta

---@class GpuRequest
---@field num? integer Number of GPUs (default 1)
---@field mode? "exclusive_process"|"shared" Sharing mode (default exclusive_process)
---@field gmodel? string GPU model, e.g. "NVIDIAA100_SXM4_80GB"

---@class JobDefinition
---@field queue string Scheduler queue
---@field wall_clock string Run limit as "HH:MM" or minutes
---@field gpu? GpuRequest
---@field job_name? string Job name template, "{dataset}" is substituted
---@field output? string Log path template, "%J" is the job id
---@field image? string Container image
---@field notify? boolean Mail on completion
---@field program? string[] Command run before --data_name (default python -m src.main)
---@field datasets? string[] Datasets submitted by default

---Job definition helpers
---@class job
job = {}

---Declare a job definition
---@param definition JobDefinition
---@return JobDefinition
function job.define(definition) end
"#
        .to_string()
    }
}
