//! GPU resource request

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SpecError;

/// How the allocated GPUs are shared with other jobs on the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuMode {
    /// One process owns each GPU
    ExclusiveProcess,
    /// GPUs may be shared with other jobs
    Shared,
}

impl GpuMode {
    /// Value used in the scheduler's resource string
    pub fn as_str(&self) -> &'static str {
        match self {
            GpuMode::ExclusiveProcess => "exclusive_process",
            GpuMode::Shared => "shared",
        }
    }
}

impl fmt::Display for GpuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GpuMode {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "exclusive_process" => Ok(GpuMode::ExclusiveProcess),
            "shared" => Ok(GpuMode::Shared),
            other => Err(SpecError::UnknownGpuMode(other.to_string())),
        }
    }
}

/// GPU allocation requested for a job
///
/// Renders as the LSF `-gpu` resource string
/// `num=<count>:mode=<mode>[:gmodel=<model>]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpuRequest {
    count: u32,
    mode: GpuMode,
    model: Option<String>,
}

impl GpuRequest {
    /// Creates a GPU request, rejecting a zero count
    pub fn new(count: u32, mode: GpuMode, model: Option<String>) -> Result<Self, SpecError> {
        if count == 0 {
            return Err(SpecError::ZeroGpus);
        }

        // An empty model string would render as a dangling `gmodel=`
        let model = model.filter(|m| !m.trim().is_empty());

        Ok(Self { count, mode, model })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn mode(&self) -> GpuMode {
        self.mode
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Resource string passed to `bsub -gpu`
    pub fn resource_string(&self) -> String {
        let mut s = format!("num={}:mode={}", self.count, self.mode);
        if let Some(model) = &self.model {
            s.push_str(":gmodel=");
            s.push_str(model);
        }
        s
    }
}

impl Default for GpuRequest {
    fn default() -> Self {
        Self {
            count: 1,
            mode: GpuMode::ExclusiveProcess,
            model: None,
        }
    }
}

impl fmt::Display for GpuRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource_string())
    }
}
