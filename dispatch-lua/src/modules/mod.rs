//! Globals available to job definition files

pub mod env;
pub mod job;

pub use env::{EnvModule, ProcessEnv, VarProvider};
pub use job::JobModule;
