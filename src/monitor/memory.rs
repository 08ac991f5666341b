use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

use log::{debug, warn};
use sysinfo::{Pid, System};

use crate::stats::MemoryMonitor;

const BYTES_PER_MB: f64 = 1024. * 1024.;

/// Default number of reads served from the cache between two process-table refreshes.
pub const SAMPLE_INTERVAL_DEFAULT: u64 = 64;

/// Resident memory of the current process, read through `sysinfo`.
///
/// Refreshing the process table costs a trip through the OS, so only one read every
/// `sample_interval` refreshes it; the others return the last sample. A refresh that would
/// block on another thread's refresh is skipped.
pub struct ProcessMemoryMonitor {
    pid: Option<Pid>,
    system: Mutex<System>,
    /// Last sample in MB, as f64 bits.
    cached_mb: AtomicU64,
    reads: AtomicU64,
    sample_interval: u64,
}

impl ProcessMemoryMonitor {
    pub fn new(sample_interval: u64) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("Cannot find own pid, memory limit will read 0 MB: {}", e);
                None
            }
        };
        let monitor = Self {
            pid,
            system: Mutex::new(System::new()),
            cached_mb: AtomicU64::new(0f64.to_bits()),
            reads: AtomicU64::new(0),
            sample_interval: sample_interval.max(1),
        };
        monitor.sample();
        monitor
    }

    /// Forces a refresh and returns the fresh value.
    pub fn sample(&self) -> f64 {
        if let (Some(pid), Ok(mut sys)) = (self.pid, self.system.try_lock()) {
            sys.refresh_process(pid);
            if let Some(p) = sys.process(pid) {
                let mb = p.memory() as f64 / BYTES_PER_MB;
                self.cached_mb.store(mb.to_bits(), Ordering::Relaxed);
                debug!("Memory sample: {:.1} MB", mb);
            }
        }
        self.cached()
    }

    pub fn cached(&self) -> f64 {
        f64::from_bits(self.cached_mb.load(Ordering::Relaxed))
    }
}

impl Default for ProcessMemoryMonitor {
    fn default() -> Self {
        Self::new(SAMPLE_INTERVAL_DEFAULT)
    }
}

impl MemoryMonitor for ProcessMemoryMonitor {
    fn current_memory_mb(&self) -> f64 {
        let n = self.reads.fetch_add(1, Ordering::Relaxed);
        if n % self.sample_interval == 0 {
            self.sample()
        } else {
            self.cached()
        }
    }
}
