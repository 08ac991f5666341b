use std::sync::Arc;

use fxhash::{FxHashMap, FxHashSet};
use log::trace;
use thiserror::Error;

use crate::dimacs::sat_instance::Literal;
use crate::stats::{ResourceExceeded, SolverEngine, SolverStats};

use super::types::{Guard, LBool, Node, Var, G_FALSE, G_TRUE};

/// Number of splits between two resource checks inside one `is_sat` call.
pub const CHECK_INTERVAL_DEFAULT: u64 = 1024;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuardError {
    #[error("literal {0} does not name a guard variable")]
    InvalidLiteral(Literal),
    #[error(transparent)]
    Resource(#[from] ResourceExceeded),
}

/// Variable of a DIMACS literal; 0 and magnitudes past `u32::MAX` have none.
pub fn literal_var(l: Literal) -> Option<Var> {
    l.unsigned_abs()
        .checked_sub(1)
        .and_then(|v| Var::try_from(v).ok())
}

/// Hash-consed boolean guard arena with a splitting satisfiability check.
///
/// Every connective application is reported to the shared `SolverStats`, and long solves poll
/// its resource limits so a breach unwinds the search mid-query.
pub struct GuardEngine {
    stats: Arc<SolverStats>,
    /// Guard -> node, and node -> guard for hash-consing.
    nodes: Vec<Node>,
    unique: FxHashMap<Node, Guard>,
    /// Distinct variables and guards handed out so far.
    vars: FxHashSet<Var>,
    guards: FxHashSet<Guard>,
    /// Construction requests, including the ones answered from the unique table.
    exprs: u64,
    check_interval: u64,
    /// Splits since the last resource check.
    splits: u64,
}

impl GuardEngine {
    pub fn new(stats: Arc<SolverStats>) -> Self {
        let mut engine = Self {
            stats,
            nodes: Vec::new(),
            unique: FxHashMap::default(),
            vars: FxHashSet::default(),
            guards: FxHashSet::default(),
            exprs: 0,
            check_interval: CHECK_INTERVAL_DEFAULT,
            splits: 0,
        };
        // Constants take the reserved handles.
        engine.intern(Node::False);
        engine.intern(Node::True);
        engine
    }

    pub fn with_check_interval(mut self, check_interval: u64) -> Self {
        self.check_interval = check_interval.max(1);
        self
    }

    pub fn stats(&self) -> &Arc<SolverStats> {
        &self.stats
    }

    pub fn node(&self, g: Guard) -> Node {
        self.nodes[g.idx()]
    }

    fn intern(&mut self, node: Node) -> Guard {
        self.exprs += 1;
        if let Some(g) = self.unique.get(&node) {
            return *g;
        }
        let g = Guard(self.nodes.len() as u32);
        self.nodes.push(node);
        self.unique.insert(node, g);
        g
    }

    fn hand_out(&mut self, g: Guard) -> Guard {
        self.guards.insert(g);
        g
    }

    pub fn constant(&mut self, b: bool) -> Guard {
        let g = if b { G_TRUE } else { G_FALSE };
        self.hand_out(g)
    }

    pub fn var(&mut self, v: Var) -> Guard {
        self.vars.insert(v);
        let g = self.intern(Node::Var(v));
        self.hand_out(g)
    }

    pub fn not(&mut self, a: Guard) -> Guard {
        self.stats.record_not();
        let g = match self.node(a) {
            Node::True => G_FALSE,
            Node::False => G_TRUE,
            Node::Not(inner) => inner,
            _ => self.intern(Node::Not(a)),
        };
        self.hand_out(g)
    }

    pub fn and(&mut self, a: Guard, b: Guard) -> Guard {
        self.stats.record_and();
        let g = if a == G_FALSE || b == G_FALSE {
            G_FALSE
        } else if a == G_TRUE || a == b {
            b
        } else if b == G_TRUE {
            a
        } else {
            self.intern(Node::And(a.min(b), a.max(b)))
        };
        self.hand_out(g)
    }

    pub fn or(&mut self, a: Guard, b: Guard) -> Guard {
        self.stats.record_or();
        let g = if a == G_TRUE || b == G_TRUE {
            G_TRUE
        } else if a == G_FALSE || a == b {
            b
        } else if b == G_FALSE {
            a
        } else {
            self.intern(Node::Or(a.min(b), a.max(b)))
        };
        self.hand_out(g)
    }

    /// Disjunction of DIMACS literals; the empty clause is false.
    pub fn clause(&mut self, lits: &[Literal]) -> Result<Guard, GuardError> {
        let mut acc = self.constant(false);
        for &l in lits {
            let v = literal_var(l).ok_or(GuardError::InvalidLiteral(l))?;
            let v = self.var(v);
            let lit = if l < 0 { self.not(v) } else { v };
            acc = self.or(acc, lit);
        }
        Ok(acc)
    }

    /// Conjunction of guards; the empty conjunction is true.
    pub fn conjoin(&mut self, guards: &[Guard]) -> Guard {
        let mut acc = self.constant(true);
        for &g in guards {
            acc = self.and(acc, g);
        }
        acc
    }

    /// Decides whether `g` has a satisfying assignment. The query and its outcome are recorded
    /// in the stats; a resource breach observed while splitting aborts the query.
    pub fn is_sat(&mut self, g: Guard) -> Result<bool, ResourceExceeded> {
        let support = self.support(g);
        let mut assigned = FxHashMap::default();
        let sat = self.split(g, &support, 0, &mut assigned)?;
        trace!("is_sat({:?}) over {} vars: {}", g, support.len(), sat);
        self.stats.record_is_sat(sat);
        Ok(sat)
    }

    // Variables reachable from g, in first-seen order.
    fn support(&self, g: Guard) -> Vec<Var> {
        let mut seen = FxHashSet::default();
        let mut vars = Vec::new();
        let mut stack = vec![g];
        while let Some(n) = stack.pop() {
            if !seen.insert(n) {
                continue;
            }
            match self.node(n) {
                Node::Var(v) => vars.push(v),
                Node::Not(a) => stack.push(a),
                Node::And(a, b) | Node::Or(a, b) => {
                    stack.push(b);
                    stack.push(a);
                }
                Node::True | Node::False => (),
            }
        }
        vars
    }

    fn split(
        &mut self,
        g: Guard,
        support: &[Var],
        depth: usize,
        assigned: &mut FxHashMap<Var, bool>,
    ) -> Result<bool, ResourceExceeded> {
        self.splits += 1;
        if self.splits >= self.check_interval {
            self.splits = 0;
            self.stats.check_resource_limits()?;
        }

        match self.eval(g, assigned) {
            LBool::True => return Ok(true),
            LBool::False => return Ok(false),
            LBool::Undef => (),
        }
        // support[..depth] is assigned, so Undef leaves at least support[depth] free.
        let Some(&v) = support.get(depth) else {
            return Ok(false);
        };
        for value in [true, false] {
            assigned.insert(v, value);
            let sat = self.split(g, support, depth + 1, assigned)?;
            assigned.remove(&v);
            if sat {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // Three-valued evaluation under a partial assignment, memoised per node.
    fn eval(&self, g: Guard, assigned: &FxHashMap<Var, bool>) -> LBool {
        let mut memo: FxHashMap<Guard, LBool> = FxHashMap::default();
        self.eval_node(g, assigned, &mut memo)
    }

    fn eval_node(
        &self,
        g: Guard,
        assigned: &FxHashMap<Var, bool>,
        memo: &mut FxHashMap<Guard, LBool>,
    ) -> LBool {
        if let Some(v) = memo.get(&g) {
            return *v;
        }
        let v = match self.node(g) {
            Node::True => LBool::True,
            Node::False => LBool::False,
            Node::Var(x) => assigned.get(&x).map_or(LBool::Undef, |b| LBool::from(*b)),
            Node::Not(a) => !self.eval_node(a, assigned, memo),
            Node::And(a, b) => {
                let l = self.eval_node(a, assigned, memo);
                if l == LBool::False {
                    LBool::False
                } else {
                    l.and(self.eval_node(b, assigned, memo))
                }
            }
            Node::Or(a, b) => {
                let l = self.eval_node(a, assigned, memo);
                if l == LBool::True {
                    LBool::True
                } else {
                    l.or(self.eval_node(b, assigned, memo))
                }
            }
        };
        memo.insert(g, v);
        v
    }
}

impl SolverEngine for GuardEngine {
    fn variable_count(&self) -> u64 {
        self.vars.len() as u64
    }

    fn guard_count(&self) -> u64 {
        self.guards.len() as u64
    }

    fn expression_count(&self) -> u64 {
        self.exprs
    }

    fn node_count(&self) -> u64 {
        self.nodes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{MemoryMonitor, ResourceKind};

    struct Mb(f64);

    impl MemoryMonitor for Mb {
        fn current_memory_mb(&self) -> f64 {
            self.0
        }
    }

    fn engine() -> GuardEngine {
        GuardEngine::new(Arc::new(SolverStats::new(Mb(0.))))
    }

    #[test]
    fn hash_consing_shares_nodes() {
        let mut e = engine();
        let x = e.var(0);
        let y = e.var(1);
        let a = e.and(x, y);
        let b = e.and(y, x);
        assert_eq!(a, b);
        let nx = e.not(x);
        assert_eq!(e.not(nx), x);
        // false, true, x, y, x&y, !x
        assert_eq!(e.node_count(), 6);
        assert_eq!(e.variable_count(), 2);
    }

    #[test]
    fn constants_simplify() {
        let mut e = engine();
        let x = e.var(3);
        let t = e.constant(true);
        let f = e.constant(false);
        assert_eq!(e.and(x, t), x);
        assert_eq!(e.and(x, f), f);
        assert_eq!(e.or(x, t), t);
        assert_eq!(e.or(f, x), x);
        assert_eq!(e.not(t), f);
    }

    #[test]
    fn connectives_are_counted() {
        let mut e = engine();
        let x = e.var(0);
        let y = e.var(1);
        let nx = e.not(x);
        let o = e.or(nx, y);
        e.and(o, x);
        let s = e.stats().snapshot();
        assert_eq!((s.and_ops, s.or_ops, s.not_ops), (1, 1, 1));
    }

    #[test]
    fn satisfiable_and_unsatisfiable() {
        let mut e = engine();
        let c1 = e.clause(&[1, 2]).unwrap();
        let c2 = e.clause(&[-1]).unwrap();
        let g = e.conjoin(&[c1, c2]);
        assert!(e.is_sat(g).unwrap());

        let c3 = e.clause(&[-2]).unwrap();
        let g = e.and(g, c3);
        assert!(!e.is_sat(g).unwrap());

        let empty = e.clause(&[]).unwrap();
        assert!(!e.is_sat(empty).unwrap());
        let t = e.conjoin(&[]);
        assert!(e.is_sat(t).unwrap());

        let s = e.stats().snapshot();
        assert_eq!(s.is_sat_queries, 4);
        assert_eq!(s.is_sat_true, 2);
    }

    #[test]
    fn tautology_under_not() {
        let mut e = engine();
        let x = e.var(0);
        let nx = e.not(x);
        let contradiction = e.and(x, nx);
        assert!(!e.is_sat(contradiction).unwrap());
        let taut = e.or(x, nx);
        let neg = e.not(taut);
        assert!(!e.is_sat(neg).unwrap());
    }

    #[test]
    fn breach_aborts_long_solve() {
        let stats = Arc::new(SolverStats::new(Mb(64.)));
        stats.set_mem_limit(32.);
        let mut e = GuardEngine::new(stats.clone()).with_check_interval(1);
        // x0 == x1 and x0 != x1: only refuted after splitting.
        let c1 = e.clause(&[1, 2]).unwrap();
        let c2 = e.clause(&[-1, -2]).unwrap();
        let c3 = e.clause(&[1, -2]).unwrap();
        let c4 = e.clause(&[-1, 2]).unwrap();
        let g = e.conjoin(&[c1, c2, c3, c4]);
        let err = e.is_sat(g).unwrap_err();
        assert_eq!(err.kind, ResourceKind::Memory);
        assert!(stats.is_aborted());
        // Aborted queries are not counted as answered.
        assert_eq!(stats.snapshot().is_sat_queries, 0);
    }

    #[test]
    fn rejects_literals_without_a_variable() {
        let mut e = engine();
        assert_eq!(e.clause(&[1, 0]), Err(GuardError::InvalidLiteral(0)));
        assert_eq!(
            e.clause(&[-4_294_967_297]),
            Err(GuardError::InvalidLiteral(-4_294_967_297))
        );
        // Largest representable variable still works, and does not alias variable 0.
        let top = e.clause(&[4_294_967_296]).unwrap();
        assert_eq!(e.node(top), Node::Var(u32::MAX));
        assert_eq!(literal_var(1), Some(0));
        assert_eq!(literal_var(0), None);
        assert_eq!(literal_var(4_294_967_297), None);
    }

    #[test]
    fn engine_counts_for_report() {
        let mut e = engine();
        let x = e.var(0);
        e.var(0);
        e.not(x);
        assert_eq!(e.variable_count(), 1);
        // x and !x
        assert_eq!(e.guard_count(), 2);
        // false, true, x twice, !x
        assert_eq!(e.expression_count(), 5);
    }
}
