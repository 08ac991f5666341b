/// Driver config
pub mod config;

/// Multi-worker path-condition search over a CNF instance
pub mod search;

pub use config::DriverConfig;
pub use search::{run, run_with, SearchOutcome, SearchReport};
