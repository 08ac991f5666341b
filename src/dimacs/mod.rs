/// DIMACS CNF input
pub mod parser;
pub mod sat_instance;

pub use parser::DimacsParser;
pub use sat_instance::SatInstance;
