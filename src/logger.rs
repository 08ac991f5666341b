use log::info;

use crate::stats::SearchLogger;

/// Forwards search statistics to the `log` facade, one aligned line per key, under the
/// `search` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSearchLogger;

impl SearchLogger for LogSearchLogger {
    fn log(&self, key: &str, value: &str) {
        info!(target: "search", "{:<28}{}", key, value);
    }
}
