//! Resource governor and statistics aggregator for guard-based symbolic search.
//!
//! [`stats::SolverStats`] counts boolean operations and satisfiability queries, accumulates
//! guard construction/solve times, and fails the search with a [`stats::ResourceExceeded`] once
//! an enabled memory or time limit is crossed. The remaining modules supply the collaborators
//! it talks to and a small search driver that exercises it.

pub mod dimacs;
pub mod driver;
pub mod guard;
pub mod logger;
pub mod monitor;
pub mod stats;
