//! Interfaces the governor reads from and reports to. Implementations live elsewhere in the
//! crate (`guard`, `monitor`, `logger`), or in the host search.

/// Point-in-time size queries against the solver engine.
pub trait SolverEngine: Send + Sync {
    fn variable_count(&self) -> u64;
    fn guard_count(&self) -> u64;
    fn expression_count(&self) -> u64;
    fn node_count(&self) -> u64;
}

/// Current process memory, in megabytes.
pub trait MemoryMonitor: Send + Sync {
    fn current_memory_mb(&self) -> f64;
}

/// Key/value sink for search statistics. Best effort: implementations must not fail or panic.
pub trait SearchLogger: Send + Sync {
    fn log(&self, key: &str, value: &str);
}

impl<T: MemoryMonitor + ?Sized> MemoryMonitor for std::sync::Arc<T> {
    fn current_memory_mb(&self) -> f64 {
        (**self).current_memory_mb()
    }
}

impl<T: SearchLogger + ?Sized> SearchLogger for std::sync::Arc<T> {
    fn log(&self, key: &str, value: &str) {
        (**self).log(key, value)
    }
}
