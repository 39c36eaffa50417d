//! Dispatch Lua Infrastructure
//!
//! Job definitions are small Lua files that declare the resource directives
//! and datasets for a batch of submissions. This crate provides:
//! - A restricted sandbox to evaluate them in
//! - The `job` and `env` globals, plus LuaLS stubs for editors
//! - Conversion of the evaluated table into a `JobTemplate`

pub mod module;
pub mod modules;
pub mod parser;
pub mod sandbox;

pub use module::{DefinitionModule, ModuleRegistry};
pub use modules::{EnvModule, JobModule, ProcessEnv, VarProvider};
pub use parser::{parse_job_definition, parse_job_definition_with};
pub use sandbox::create_sandbox;

/// Registry with every module a definition can use, for stub generation
pub fn stub_modules() -> ModuleRegistry {
    ModuleRegistry::new()
        .with(JobModule)
        .with(EnvModule::new(ProcessEnv))
}
