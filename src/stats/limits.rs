/// Resource ceilings for one search. A value of 0 disables the corresponding limit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResourceLimits {
    /// Memory limit in megabytes (0 means infinite)
    pub mem_limit_mb: f64,
    /// Time limit in seconds (0 means infinite)
    pub time_limit_sec: f64,
}

impl ResourceLimits {
    pub fn new(mem_limit_mb: f64, time_limit_sec: f64) -> Self {
        Self {
            mem_limit_mb: sanitize(mem_limit_mb),
            time_limit_sec: sanitize(time_limit_sec),
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn is_memory_limited(&self) -> bool {
        self.mem_limit_mb > 0.
    }

    pub fn is_time_limited(&self) -> bool {
        self.time_limit_sec > 0.
    }
}

/// Limits only accept non-negative finite values; anything else reads as "no limit".
pub(crate) fn sanitize(v: f64) -> f64 {
    if v.is_finite() && v > 0. {
        v
    } else {
        0.
    }
}
