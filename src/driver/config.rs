use crate::guard::engine::CHECK_INTERVAL_DEFAULT;
use crate::monitor::memory::SAMPLE_INTERVAL_DEFAULT;
use crate::stats::ResourceLimits;

pub const WORKERS_DEFAULT: usize = 1;
pub const SEED_DEFAULT: u64 = 0;
// Deep guards recurse once per conjunct while evaluating.
pub const WORKER_STACK_DEFAULT: usize = 64 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Log filter, handed to the `env_logger` builder in `main`; `RUST_LOG` overrides it.
    pub verbosity: log::LevelFilter,
    /// Memory and time ceilings; 0 disables either.
    pub limits: ResourceLimits,
    /// Number of parallel search workers sharing one governor.
    pub workers: usize,
    /// Base seed for the per-worker clause order. Worker 0 keeps the file order.
    pub seed: u64,

    /// Memory reads served from cache between two process-table refreshes.
    pub sample_interval: u64,
    /// Splits between two resource checks inside one satisfiability query.
    pub check_interval: u64,
    pub worker_stack: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            verbosity: log::LevelFilter::Info,
            limits: ResourceLimits::unlimited(),
            workers: WORKERS_DEFAULT,
            seed: SEED_DEFAULT,

            sample_interval: SAMPLE_INTERVAL_DEFAULT,
            check_interval: CHECK_INTERVAL_DEFAULT,
            worker_stack: WORKER_STACK_DEFAULT,
        }
    }
}
