use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{bail, Context, Result};
use log::{debug, warn};

use super::sat_instance::{Clause, Literal, SatInstance};

/// Reader for DIMACS CNF files: `c` comment lines, one `p cnf <vars> <clauses>` header, then
/// whitespace separated literals with every clause closed by `0`.
pub struct DimacsParser<R> {
    reader: R,
}

impl DimacsParser<BufReader<File>> {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> DimacsParser<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { reader }
    }

    pub fn parse(self) -> Result<SatInstance> {
        let mut instance = SatInstance::default();
        let mut header = false;
        let mut lits: Vec<Literal> = Vec::new();

        for (no, line) in self.reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('c') {
                continue;
            }
            // SATLIB files end with a `%` line.
            if line.starts_with('%') {
                break;
            }
            if line.starts_with('p') {
                if header {
                    bail!("line {}: duplicate problem line", no + 1);
                }
                let fields: Vec<_> = line.split_whitespace().collect();
                let [_, "cnf", vars, clauses] = fields[..] else {
                    bail!("line {}: expected `p cnf <vars> <clauses>`, got {:?}", no + 1, line);
                };
                instance.n_vars = vars
                    .parse()
                    .with_context(|| format!("line {}: bad variable count", no + 1))?;
                instance.n_clauses = clauses
                    .parse()
                    .with_context(|| format!("line {}: bad clause count", no + 1))?;
                // Guard variables are u32.
                if instance.n_vars > u32::MAX as usize {
                    bail!(
                        "line {}: {} variables exceed the supported {}",
                        no + 1,
                        instance.n_vars,
                        u32::MAX
                    );
                }
                header = true;
                continue;
            }
            if !header {
                bail!("line {}: clause before problem line", no + 1);
            }
            for tok in line.split_whitespace() {
                let lit: Literal = tok
                    .parse()
                    .with_context(|| format!("line {}: bad literal {:?}", no + 1, tok))?;
                if lit == 0 {
                    instance.clauses.push(Clause {
                        lits: std::mem::take(&mut lits),
                    });
                    continue;
                }
                if lit.unsigned_abs() as usize > instance.n_vars {
                    bail!(
                        "line {}: literal {} out of range for {} variables",
                        no + 1,
                        lit,
                        instance.n_vars
                    );
                }
                instance.vars.insert(lit.abs());
                lits.push(lit);
            }
        }

        if !header {
            bail!("missing problem line");
        }
        if !lits.is_empty() {
            warn!("Last clause is not terminated by 0; keeping it");
            instance.clauses.push(Clause { lits });
        }
        if instance.clauses.len() != instance.n_clauses {
            bail!(
                "header declares {} clauses, found {}",
                instance.n_clauses,
                instance.clauses.len()
            );
        }
        debug!(
            "Parsed {} vars ({} used), {} clauses",
            instance.n_vars,
            instance.vars.len(),
            instance.n_clauses
        );
        Ok(instance)
    }
}
