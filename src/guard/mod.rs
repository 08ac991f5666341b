/// Guard construction and satisfiability
pub mod engine;

/// Guard handles, nodes, and three-valued logic
pub mod types;

pub use engine::{GuardEngine, GuardError};
pub use types::{Guard, SolveStatus, Var};
