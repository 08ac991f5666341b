use std::fmt::Display;

/// Share of `total` taken by `spent`, as a percentage. Nothing spent is always 0%, even when
/// `total` is 0 as well.
pub fn percent_of_total(spent: f64, total: f64) -> f64 {
    if spent == 0. {
        0.
    } else {
        spent * 100. / total
    }
}

/// Percentage of satisfiability queries that came back satisfiable.
pub fn sat_percent(queries: u64, true_results: u64) -> f64 {
    if queries == 0 {
        0.
    } else {
        true_results as f64 * 100. / queries as f64
    }
}

/// Copy of every counter at one point in time. Timings are in milliseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Totals (i.e. monotonically increasing within a run) of:
    /// - and_ops / or_ops / not_ops: boolean connectives applied.
    /// - is_sat_queries: satisfiability checks issued.
    /// - is_sat_true: checks that returned satisfiable.
    pub and_ops: u64,
    pub or_ops: u64,
    pub not_ops: u64,
    pub is_sat_queries: u64,
    pub is_sat_true: u64,

    /// Guard construction and solve times; max is the largest single sample.
    pub guard_create_total_ms: f64,
    pub guard_create_max_ms: f64,
    pub guard_solve_total_ms: f64,
    pub guard_solve_max_ms: f64,
}

impl StatsSnapshot {
    pub fn sat_percent(&self) -> f64 {
        sat_percent(self.is_sat_queries, self.is_sat_true)
    }
}

impl Display for StatsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Guard Statistics:")?;
        writeln!(f, "  and/or/not ops: {}/{}/{}", self.and_ops, self.or_ops, self.not_ops)?;
        writeln!(
            f,
            "  sat queries: {} ({} sat, {:.1}%)",
            self.is_sat_queries,
            self.is_sat_true,
            self.sat_percent()
        )?;
        writeln!(
            f,
            "  create guards (ms): total {:.3}, max {:.3}",
            self.guard_create_total_ms, self.guard_create_max_ms
        )?;
        writeln!(
            f,
            "  solve guards (ms): total {:.3}, max {:.3}",
            self.guard_solve_total_ms, self.guard_solve_max_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_total_zero_spent() {
        assert_eq!(percent_of_total(0., 0.), 0.);
        assert_eq!(percent_of_total(0., 100.), 0.);
    }

    #[test]
    fn percent_of_total_ratio() {
        assert_eq!(percent_of_total(25., 100.), 25.);
        assert_eq!(percent_of_total(3., 4.), 75.);
    }

    #[test]
    fn sat_percent_is_true_over_queries() {
        assert_eq!(sat_percent(0, 0), 0.);
        assert_eq!(sat_percent(0, 7), 0.);
        assert_eq!(sat_percent(10, 3), 30.);
        assert_eq!(sat_percent(4, 4), 100.);
    }

    #[test]
    fn display_mentions_everything() {
        let s = StatsSnapshot {
            and_ops: 3,
            or_ops: 2,
            not_ops: 1,
            is_sat_queries: 4,
            is_sat_true: 1,
            guard_create_total_ms: 1.5,
            guard_create_max_ms: 1.0,
            guard_solve_total_ms: 2.0,
            guard_solve_max_ms: 2.0,
        };
        let out = s.to_string();
        assert!(out.starts_with("Guard Statistics:"));
        assert!(out.contains("and/or/not ops: 3/2/1"));
        assert!(out.contains("sat queries: 4 (1 sat, 25.0%)"));
        assert!(out.contains("total 1.500, max 1.000"));
    }
}
