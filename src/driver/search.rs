use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossbeam::channel;
use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    dimacs::SatInstance,
    guard::{GuardEngine, GuardError, SolveStatus},
    logger::LogSearchLogger,
    monitor::ProcessMemoryMonitor,
    stats::{ResourceExceeded, SearchLogger, SolverStats, StatsSnapshot},
};

use super::config::DriverConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Some worker ran to completion. `steps` is the number of clauses in the final path
    /// condition.
    Finished {
        worker: usize,
        status: SolveStatus,
        steps: usize,
    },
    /// A resource limit was breached; the whole search unwound.
    Aborted(ResourceExceeded),
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub elapsed: Duration,
    pub stats: StatsSnapshot,
}

/// Runs the search with a process memory monitor, reporting through the `log` facade.
pub fn run(instance: SatInstance, cfg: &DriverConfig) -> Result<SearchReport> {
    let monitor = ProcessMemoryMonitor::new(cfg.sample_interval);
    let stats = Arc::new(SolverStats::with_limits(monitor, cfg.limits));
    run_with(instance, cfg, stats, &LogSearchLogger)
}

/// Explores the instance as a growing path condition: each step conjoins one more clause
/// (guard creation) and checks the result (guard solve), until the path becomes infeasible or
/// every clause is in. Workers share `stats`; the first to finish decides the outcome.
///
/// The reported operation and query counts cover every worker, while `#-vars`, `#-guards`,
/// `#-expr` and `solver-#-nodes` describe the engine of the worker that decided the outcome.
pub fn run_with(
    instance: SatInstance,
    cfg: &DriverConfig,
    stats: Arc<SolverStats>,
    logger: &dyn SearchLogger,
) -> Result<SearchReport> {
    let instance = Arc::new(instance);
    let stop = Arc::new(AtomicBool::new(false));
    let start = Instant::now();

    let (s, r) = channel::unbounded();
    for id in 0..cfg.workers.max(1) {
        debug!("Starting search worker {}...", id);

        let s = s.clone();
        let instance = instance.clone();
        let stop = stop.clone();
        let order = clause_order(instance.clauses.len(), id, cfg.seed);
        let mut engine = GuardEngine::new(stats.clone()).with_check_interval(cfg.check_interval);
        thread::Builder::new()
            .name(format!("search-{id}"))
            .stack_size(cfg.worker_stack)
            .spawn(move || {
                let res = explore(&instance, &order, &mut engine, start, &stop);
                // Receiver is gone once another worker won.
                let _ = s.send((id, engine, res));
            })
            .context("spawning search worker")?;
    }
    drop(s);

    let outcome;
    let engine;
    loop {
        let (id, e, res) = r
            .recv()
            .context("every search worker exited without a result")?;
        match res {
            Ok(Some((status, steps))) => {
                outcome = SearchOutcome::Finished {
                    worker: id,
                    status,
                    steps,
                };
            }
            Err(GuardError::Resource(breach)) => outcome = SearchOutcome::Aborted(breach),
            Err(err) => {
                stop.store(true, Ordering::Relaxed);
                return Err(err).with_context(|| format!("search worker {id}"));
            }
            // Cancelled workers only show up after a winner; keep waiting for a real result.
            Ok(None) => continue,
        }
        engine = e;
        break;
    }
    stop.store(true, Ordering::Relaxed);
    let elapsed = start.elapsed();

    match &outcome {
        SearchOutcome::Finished { worker, status, steps } => {
            info!("Worker {} finished: {} after {} steps", worker, status, steps)
        }
        SearchOutcome::Aborted(e) => info!("Search aborted: {}", e),
    }
    // Counters are shared by every worker; engine sizes are the winning worker's own.
    stats.report_stats(&engine, logger);
    stats.report_timing(elapsed, logger);

    Ok(SearchReport {
        outcome,
        elapsed,
        stats: stats.snapshot(),
    })
}

// Worker 0 keeps the file order; the rest get a seeded shuffle.
fn clause_order(n: usize, worker: usize, seed: u64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    if worker > 0 {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(worker as u64));
        order.shuffle(&mut rng);
    }
    order
}

/// Returns `None` when told to stop before finishing.
fn explore(
    instance: &SatInstance,
    order: &[usize],
    engine: &mut GuardEngine,
    start: Instant,
    stop: &AtomicBool,
) -> Result<Option<(SolveStatus, usize)>, GuardError> {
    let stats = engine.stats().clone();
    let mut path = engine.constant(true);

    for (step, &ci) in order.iter().enumerate() {
        if stop.load(Ordering::Relaxed) {
            return Ok(None);
        }

        let t = Instant::now();
        let c = engine.clause(&instance.clauses[ci].lits)?;
        path = engine.and(path, c);
        stats.record_guard_create(t.elapsed())?;

        let t = Instant::now();
        let sat = engine.is_sat(path)?;
        stats.record_guard_solve(t.elapsed())?;
        stats.check_time_limit(start.elapsed())?;

        if !sat {
            return Ok(Some((SolveStatus::Unsat, step + 1)));
        }
    }
    Ok(Some((SolveStatus::Sat, order.len())))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::dimacs::DimacsParser;
    use crate::stats::{MemoryMonitor, ResourceKind, ResourceLimits};

    struct Mb(f64);

    impl MemoryMonitor for Mb {
        fn current_memory_mb(&self) -> f64 {
            self.0
        }
    }

    #[derive(Default)]
    struct Lines(Mutex<Vec<(String, String)>>);

    impl SearchLogger for Lines {
        fn log(&self, key: &str, value: &str) {
            self.0.lock().unwrap().push((key.into(), value.into()));
        }
    }

    const SAT: &str = "p cnf 3 3\n1 2 0\n-1 3 0\n-2 -3 0\n";
    const UNSAT: &str = "p cnf 2 4\n1 2 0\n-1 2 0\n1 -2 0\n-1 -2 0\n";

    fn instance(s: &str) -> SatInstance {
        DimacsParser::from_reader(s.as_bytes()).parse().unwrap()
    }

    fn run_fixed(s: &str, cfg: &DriverConfig, mb: f64) -> (SearchReport, Lines) {
        let stats = Arc::new(SolverStats::with_limits(Mb(mb), cfg.limits));
        let lines = Lines::default();
        let report = run_with(instance(s), cfg, stats, &lines).unwrap();
        (report, lines)
    }

    #[test]
    fn satisfiable_instance_runs_to_the_end() {
        let (report, lines) = run_fixed(SAT, &DriverConfig::default(), 0.);
        assert_eq!(
            report.outcome,
            SearchOutcome::Finished {
                worker: 0,
                status: SolveStatus::Sat,
                steps: 3
            }
        );
        assert_eq!(report.stats.is_sat_queries, 3);
        assert_eq!(report.stats.is_sat_true, 3);
        let lines = lines.0.lock().unwrap();
        assert!(lines.iter().any(|(k, v)| k == "solver-%-sat-ops-sat" && v == "100.0"));
        assert!(lines.iter().any(|(k, v)| k == "#-vars" && v == "3"));
    }

    #[test]
    fn unsatisfiable_prefix_stops_early() {
        let (report, _) = run_fixed(UNSAT, &DriverConfig::default(), 0.);
        assert_eq!(
            report.outcome,
            SearchOutcome::Finished {
                worker: 0,
                status: SolveStatus::Unsat,
                steps: 4
            }
        );
        assert_eq!(report.stats.is_sat_true, 3);
        assert!(report.stats.guard_create_max_ms <= report.stats.guard_create_total_ms);
    }

    #[test]
    fn workers_agree_on_status() {
        let cfg = DriverConfig {
            workers: 4,
            seed: 7,
            ..Default::default()
        };
        let (report, _) = run_fixed(UNSAT, &cfg, 0.);
        match report.outcome {
            SearchOutcome::Finished { status, .. } => assert_eq!(status, SolveStatus::Unsat),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn memory_breach_aborts_search() {
        let cfg = DriverConfig {
            limits: ResourceLimits::new(100., 0.),
            workers: 2,
            ..Default::default()
        };
        let (report, lines) = run_fixed(SAT, &cfg, 101.);
        match report.outcome {
            SearchOutcome::Aborted(e) => {
                assert_eq!(e.kind, ResourceKind::Memory);
                assert_eq!(e.observed, 101.);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        // Stats still get reported after an abort.
        assert!(!lines.0.lock().unwrap().is_empty());
    }

    #[test]
    fn memory_at_limit_is_fine() {
        let cfg = DriverConfig {
            limits: ResourceLimits::new(100., 0.),
            ..Default::default()
        };
        let (report, _) = run_fixed(SAT, &cfg, 100.);
        assert!(matches!(report.outcome, SearchOutcome::Finished { .. }));
    }

    #[test]
    fn time_breach_aborts_search() {
        let cfg = DriverConfig {
            limits: ResourceLimits::new(0., 1e-9),
            ..Default::default()
        };
        let (report, _) = run_fixed(SAT, &cfg, 0.);
        match report.outcome {
            SearchOutcome::Aborted(e) => assert_eq!(e.kind, ResourceKind::Time),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn literal_past_u32_is_an_error_not_a_result() {
        use crate::dimacs::sat_instance::Clause;

        // x1 and not x4294967297; must not alias x1.
        let mut inst = SatInstance {
            n_vars: 4_294_967_297,
            n_clauses: 2,
            clauses: vec![
                Clause { lits: vec![1] },
                Clause {
                    lits: vec![-4_294_967_297],
                },
            ],
            ..Default::default()
        };
        inst.vars.extend([1, 4_294_967_297]);
        let stats = Arc::new(SolverStats::new(Mb(0.)));
        let err = run_with(inst, &DriverConfig::default(), stats, &Lines::default()).unwrap_err();
        assert!(
            err.chain().any(|c| c.to_string().contains("-4294967297")),
            "{err:#}"
        );
    }

    #[test]
    fn engine_sizes_come_from_the_deciding_worker() {
        let cfg = DriverConfig {
            workers: 3,
            seed: 5,
            ..Default::default()
        };
        let (report, lines) = run_fixed(SAT, &cfg, 0.);
        assert!(matches!(report.outcome, SearchOutcome::Finished { .. }));
        let lines = lines.0.lock().unwrap();
        let get = |key: &str| {
            lines
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        // One worker's engine only ever sees the instance's three variables.
        assert_eq!(get("#-vars"), "3");
        // Query counts cover every worker that got that far, at least the winner's three.
        assert!(get("solver-#-sat-ops").parse::<u64>().unwrap() >= 3);
    }

    #[test]
    fn shuffles_are_seeded() {
        assert_eq!(clause_order(5, 0, 1), vec![0, 1, 2, 3, 4]);
        assert_eq!(clause_order(50, 3, 9), clause_order(50, 3, 9));
        let mut o = clause_order(50, 2, 9);
        o.sort();
        assert_eq!(o, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn run_with_process_monitor() {
        let report = run(instance(SAT), &DriverConfig::default()).unwrap();
        assert!(matches!(report.outcome, SearchOutcome::Finished { .. }));
    }
}
