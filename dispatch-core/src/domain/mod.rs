//! Core domain types
//!
//! This module contains the structures describing a batch submission: the
//! per-dataset job, its resource requests, the template a definition file
//! expands from, and the record a scheduler hands back.

pub mod gpu;
pub mod job;
pub mod log_path;
pub mod submission;
pub mod template;
pub mod wall_clock;

pub use gpu::{GpuMode, GpuRequest};
pub use job::JobSpec;
pub use log_path::LogPath;
pub use submission::{JobId, Submission};
pub use template::JobTemplate;
pub use wall_clock::WallClock;
