use std::fmt::Display;

use thiserror::Error;

/// Which resource ceiling was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Memory,
    Time,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Memory => write!(f, "memory"),
            ResourceKind::Time => write!(f, "time"),
        }
    }
}

/// Raised when an enabled memory or time limit is exceeded. Not recoverable at the governor;
/// propagate it with `?` until the top-level search driver.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ResourceExceeded {
    pub kind: ResourceKind,
    /// Observed value, in MB for memory and seconds for time.
    pub observed: f64,
    pub message: String,
}

impl ResourceExceeded {
    pub fn memory(observed_mb: f64) -> Self {
        Self {
            kind: ResourceKind::Memory,
            observed: observed_mb,
            message: format!("Max memory limit reached: {:.1} MB", observed_mb),
        }
    }

    pub fn time(observed_sec: f64) -> Self {
        Self {
            kind: ResourceKind::Time,
            observed: observed_sec,
            message: format!("Max time limit reached: {:.1} seconds", observed_sec),
        }
    }
}
