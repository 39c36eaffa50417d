//! Output log path template

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Placeholder the scheduler replaces with the job id
pub const JOB_ID_PLACEHOLDER: &str = "%J";

/// Path of the job's output log, possibly containing `%J`
///
/// The template is handed to the scheduler untouched; `resolve` performs the
/// same substitution locally once the job id is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogPath(String);

impl LogPath {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn template(&self) -> &str {
        &self.0
    }

    /// Whether the scheduler will interpolate a job id into this path
    pub fn has_job_id(&self) -> bool {
        self.0.contains(JOB_ID_PLACEHOLDER)
    }

    /// Substitutes the job id into the template
    pub fn resolve(&self, job_id: impl fmt::Display) -> PathBuf {
        PathBuf::from(self.0.replace(JOB_ID_PLACEHOLDER, &job_id.to_string()))
    }

    /// Leading directories of the log that can be created before submission
    ///
    /// Stops at the first component containing `%J`, since that part of the
    /// path only exists once the scheduler assigns an id.
    pub fn parent_dir(&self) -> Option<PathBuf> {
        let parent = Path::new(&self.0).parent()?;

        let mut dir = PathBuf::new();
        for component in parent.components() {
            if component
                .as_os_str()
                .to_string_lossy()
                .contains(JOB_ID_PLACEHOLDER)
            {
                break;
            }
            dir.push(component);
        }

        Some(dir).filter(|p| !p.as_os_str().is_empty())
    }

    /// Whether a directory (not just the file name) depends on the job id
    pub fn has_job_id_dir(&self) -> bool {
        Path::new(&self.0)
            .parent()
            .is_some_and(|p| p.to_string_lossy().contains(JOB_ID_PLACEHOLDER))
    }
}

impl fmt::Display for LogPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LogPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl Serialize for LogPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
