//! Wall-clock run limit

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SpecError;

/// Maximum run time the scheduler enforces for a job
///
/// Accepts the LSF `-W [hour:]minute` forms and always renders as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallClock {
    minutes: u32,
}

impl WallClock {
    /// Creates a limit from hours and minutes
    pub fn new(hours: u32, minutes: u32) -> Result<Self, SpecError> {
        let invalid = || SpecError::InvalidWallClock(format!("{}:{:02}", hours, minutes));
        if minutes >= 60 {
            return Err(invalid());
        }
        let total = hours
            .checked_mul(60)
            .and_then(|m| m.checked_add(minutes))
            .ok_or_else(invalid)?;
        Self::from_minutes(total)
    }

    /// Creates a limit from a total number of minutes
    pub fn from_minutes(minutes: u32) -> Result<Self, SpecError> {
        if minutes == 0 {
            return Err(SpecError::InvalidWallClock(minutes.to_string()));
        }
        Ok(Self { minutes })
    }

    pub fn hours(&self) -> u32 {
        self.minutes / 60
    }

    pub fn minutes(&self) -> u32 {
        self.minutes % 60
    }

    pub fn total_minutes(&self) -> u32 {
        self.minutes
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.minutes) * 60)
    }
}

impl FromStr for WallClock {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || SpecError::InvalidWallClock(s.to_string());

        let parse_part = |part: &str| -> Result<u32, SpecError> {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u32>().map_err(|_| invalid())
        };

        match trimmed.split_once(':') {
            Some((h, m)) => {
                let hours = parse_part(h)?;
                let minutes = parse_part(m)?;
                Self::new(hours, minutes).map_err(|_| invalid())
            }
            None => Self::from_minutes(parse_part(trimmed)?).map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minutes())
    }
}

impl Serialize for WallClock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
