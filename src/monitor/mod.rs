/// Process memory sampling
pub mod memory;

pub use memory::ProcessMemoryMonitor;
