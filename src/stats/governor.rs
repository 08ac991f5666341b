use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex, PoisonError,
    },
    time::Duration,
};

use crossbeam::utils::CachePadded;
use log::{debug, warn};

use super::{
    collaborators::{MemoryMonitor, SearchLogger, SolverEngine},
    error::ResourceExceeded,
    limits::{sanitize, ResourceLimits},
    report::{percent_of_total, sat_percent, StatsSnapshot},
};

/// Resource governor and statistics aggregator for one search run.
///
/// Share it between solver call sites with an `Arc`. Every update is a single atomic RMW, so
/// parallel workers never lose increments and never wait on each other. The only lock is taken
/// after a breach, once the search is already unwinding.
pub struct SolverStats {
    /// Boolean connective and satisfiability query counters.
    and_ops: CachePadded<AtomicU64>,
    or_ops: CachePadded<AtomicU64>,
    not_ops: CachePadded<AtomicU64>,
    is_sat_queries: CachePadded<AtomicU64>,
    is_sat_true: CachePadded<AtomicU64>,

    /// Guard timings, in nanoseconds. Totals are bumped before maxima (see `record_time`).
    guard_create_total: CachePadded<AtomicU64>,
    guard_create_max: CachePadded<AtomicU64>,
    guard_solve_total: CachePadded<AtomicU64>,
    guard_solve_max: CachePadded<AtomicU64>,

    /// Limits, stored as f64 bits so they can be changed mid-run.
    mem_limit_mb: AtomicU64,
    time_limit_sec: AtomicU64,

    /// Normal -> Aborted latch; the first breach is kept and handed to every later check.
    aborted: AtomicBool,
    first_breach: Mutex<Option<ResourceExceeded>>,

    monitor: Box<dyn MemoryMonitor>,
}

impl SolverStats {
    pub fn new<M: MemoryMonitor + 'static>(monitor: M) -> Self {
        Self::with_limits(monitor, ResourceLimits::unlimited())
    }

    pub fn with_limits<M: MemoryMonitor + 'static>(monitor: M, limits: ResourceLimits) -> Self {
        Self {
            and_ops: Default::default(),
            or_ops: Default::default(),
            not_ops: Default::default(),
            is_sat_queries: Default::default(),
            is_sat_true: Default::default(),
            guard_create_total: Default::default(),
            guard_create_max: Default::default(),
            guard_solve_total: Default::default(),
            guard_solve_max: Default::default(),
            mem_limit_mb: AtomicU64::new(sanitize(limits.mem_limit_mb).to_bits()),
            time_limit_sec: AtomicU64::new(sanitize(limits.time_limit_sec).to_bits()),
            aborted: AtomicBool::new(false),
            first_breach: Mutex::new(None),
            monitor: Box::new(monitor),
        }
    }

    #[inline]
    pub fn record_and(&self) {
        self.and_ops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_or(&self) {
        self.or_ops.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_not(&self) {
        self.not_ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one satisfiability query and, if it was satisfiable, one positive result.
    #[inline]
    pub fn record_is_sat(&self, sat: bool) {
        self.is_sat_queries.fetch_add(1, Ordering::Relaxed);
        if sat {
            self.is_sat_true.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Accounts one guard construction, then checks the resource limits.
    pub fn record_guard_create(&self, elapsed: Duration) -> Result<(), ResourceExceeded> {
        record_time(&self.guard_create_total, &self.guard_create_max, elapsed);
        self.check_resource_limits()
    }

    /// Accounts one guard solve, then checks the resource limits.
    pub fn record_guard_solve(&self, elapsed: Duration) -> Result<(), ResourceExceeded> {
        record_time(&self.guard_solve_total, &self.guard_solve_max, elapsed);
        self.check_resource_limits()
    }

    /// Fails once the process uses strictly more memory than the configured limit. With the
    /// limit disabled the monitor is never consulted.
    pub fn check_resource_limits(&self) -> Result<(), ResourceExceeded> {
        self.check_aborted()?;

        let limit = self.mem_limit_mb();
        if limit > 0. {
            let current = self.monitor.current_memory_mb();
            if current > limit {
                return Err(self.abort(ResourceExceeded::memory(current)));
            }
        }
        Ok(())
    }

    /// Fails once `elapsed` is strictly longer than the configured time limit. The clock belongs
    /// to the caller; the governor only compares.
    pub fn check_time_limit(&self, elapsed: Duration) -> Result<(), ResourceExceeded> {
        self.check_aborted()?;

        let limit = self.time_limit_sec();
        let secs = elapsed.as_secs_f64();
        if limit > 0. && secs > limit {
            return Err(self.abort(ResourceExceeded::time(secs)));
        }
        Ok(())
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// The breach that aborted this run, if any.
    pub fn breach(&self) -> Option<ResourceExceeded> {
        self.first_breach
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_aborted(&self) -> Result<(), ResourceExceeded> {
        if self.is_aborted() {
            if let Some(e) = self.breach() {
                return Err(e);
            }
        }
        Ok(())
    }

    fn abort(&self, e: ResourceExceeded) -> ResourceExceeded {
        let mut first = self
            .first_breach
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let e = first
            .get_or_insert_with(|| {
                warn!("Aborting search: {}", e);
                e
            })
            .clone();
        self.aborted.store(true, Ordering::Release);
        e
    }

    pub fn set_mem_limit(&self, mb: f64) {
        self.mem_limit_mb
            .store(sanitize(mb).to_bits(), Ordering::Relaxed);
    }

    pub fn set_time_limit(&self, sec: f64) {
        self.time_limit_sec
            .store(sanitize(sec).to_bits(), Ordering::Relaxed);
    }

    pub fn set_limits(&self, limits: ResourceLimits) {
        self.set_mem_limit(limits.mem_limit_mb);
        self.set_time_limit(limits.time_limit_sec);
    }

    pub fn mem_limit_mb(&self) -> f64 {
        f64::from_bits(self.mem_limit_mb.load(Ordering::Relaxed))
    }

    pub fn time_limit_sec(&self) -> f64 {
        f64::from_bits(self.time_limit_sec.load(Ordering::Relaxed))
    }

    pub fn limits(&self) -> ResourceLimits {
        ResourceLimits {
            mem_limit_mb: self.mem_limit_mb(),
            time_limit_sec: self.time_limit_sec(),
        }
    }

    /// Zeroes every counter and clears the abort latch for the next run. Limits are kept.
    pub fn reset(&self) {
        for c in [
            &self.and_ops,
            &self.or_ops,
            &self.not_ops,
            &self.is_sat_queries,
            &self.is_sat_true,
            &self.guard_create_total,
            &self.guard_create_max,
            &self.guard_solve_total,
            &self.guard_solve_max,
        ] {
            c.store(0, Ordering::Relaxed);
        }
        let mut first = self
            .first_breach
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *first = None;
        self.aborted.store(false, Ordering::Release);
        debug!("Solver stats reset");
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        // Max before total: a visible max always comes with its sample already in the total.
        let guard_create_max_ms = ns_to_ms(self.guard_create_max.load(Ordering::Acquire));
        let guard_create_total_ms = ns_to_ms(self.guard_create_total.load(Ordering::Acquire));
        let guard_solve_max_ms = ns_to_ms(self.guard_solve_max.load(Ordering::Acquire));
        let guard_solve_total_ms = ns_to_ms(self.guard_solve_total.load(Ordering::Acquire));
        StatsSnapshot {
            and_ops: self.and_ops.load(Ordering::Relaxed),
            or_ops: self.or_ops.load(Ordering::Relaxed),
            not_ops: self.not_ops.load(Ordering::Relaxed),
            is_sat_queries: self.is_sat_queries.load(Ordering::Relaxed),
            is_sat_true: self.is_sat_true.load(Ordering::Relaxed),
            guard_create_total_ms,
            guard_create_max_ms,
            guard_solve_total_ms,
            guard_solve_max_ms,
        }
    }

    /// Logs one line per counter, together with the engine's current sizes.
    pub fn report_stats(&self, engine: &dyn SolverEngine, logger: &dyn SearchLogger) {
        let s = self.snapshot();
        logger.log("#-vars", &engine.variable_count().to_string());
        logger.log("#-guards", &engine.guard_count().to_string());
        logger.log("#-expr", &engine.expression_count().to_string());
        logger.log("#-and-ops", &s.and_ops.to_string());
        logger.log("#-or-ops", &s.or_ops.to_string());
        logger.log("#-not-ops", &s.not_ops.to_string());
        logger.log("solver-#-nodes", &engine.node_count().to_string());
        logger.log("solver-#-sat-ops", &s.is_sat_queries.to_string());
        logger.log("solver-#-sat-ops-sat", &s.is_sat_true.to_string());
        logger.log(
            "solver-%-sat-ops-sat",
            &format!("{:.1}", sat_percent(s.is_sat_queries, s.is_sat_true)),
        );
    }

    /// Logs guard timings, and their share of the whole search time.
    pub fn report_timing(&self, search_time: Duration, logger: &dyn SearchLogger) {
        let s = self.snapshot();
        let total_ms = search_time.as_secs_f64() * 1000.;
        logger.log("time-create-guards-ms", &format!("{:.1}", s.guard_create_total_ms));
        logger.log("time-max-create-guards-ms", &format!("{:.1}", s.guard_create_max_ms));
        logger.log("time-solve-guards-ms", &format!("{:.1}", s.guard_solve_total_ms));
        logger.log("time-max-solve-guards-ms", &format!("{:.1}", s.guard_solve_max_ms));
        logger.log(
            "time-create-guards-%",
            &format!("{:.1}", percent_of_total(s.guard_create_total_ms, total_ms)),
        );
        logger.log(
            "time-solve-guards-%",
            &format!("{:.1}", percent_of_total(s.guard_solve_total_ms, total_ms)),
        );
    }
}

// Total first, then max (Release), so readers that see a max also see its sample in the total.
#[inline]
fn record_time(total: &AtomicU64, max: &AtomicU64, elapsed: Duration) {
    let ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
    total.fetch_add(ns, Ordering::Release);
    max.fetch_max(ns, Ordering::Release);
}

fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / 1_000_000.
}
