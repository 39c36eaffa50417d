//! Dispatch Core
//!
//! Core types for submitting analysis jobs to an LSF-style batch scheduler.
//!
//! This crate contains:
//! - Domain types: jobs, GPU requests, wall-clock limits, log paths
//! - Rendering of jobs into `bsub` arguments and `#BSUB` scripts

pub mod domain;
pub mod error;
pub mod render;

pub use error::SpecError;
