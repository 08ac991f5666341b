use std::fmt::Debug;

use fxhash::FxHashSet;

#[derive(Clone, Default)]
pub struct SatInstance {
    pub n_vars: usize,
    pub n_clauses: usize,
    pub clauses: Vec<Clause>,
    // (Positive) list of all variables mentioned by some clause
    pub vars: FxHashSet<Variable>,
}

impl Debug for SatInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "n_vars: {}\tn_clauses: {}", self.n_vars, self.n_clauses)?;
        for c in &self.clauses {
            write!(f, "Clause:")?;
            for l in &c.lits {
                write!(f, " {l}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    pub lits: Vec<Literal>,
}

/// DIMACS literal: a non-zero variable number, negative when negated.
pub type Literal = i64;
pub type Variable = i64;
