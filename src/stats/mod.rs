/// Resource governor and statistics aggregator
pub mod governor;

/// Interfaces to the solver engine, memory monitor, and search logger
pub mod collaborators;
pub mod error;
pub mod limits;

/// Percentages and snapshots
pub mod report;

pub use collaborators::{MemoryMonitor, SearchLogger, SolverEngine};
pub use error::{ResourceExceeded, ResourceKind};
pub use governor::SolverStats;
pub use limits::ResourceLimits;
pub use report::{percent_of_total, sat_percent, StatsSnapshot};
