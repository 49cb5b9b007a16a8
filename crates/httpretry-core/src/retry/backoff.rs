//! Exponential backoff between attempts.

use std::time::Duration;

use super::history::RequestHistory;
use super::policy::Retry;

/// Number of most recent attempts that were not redirects, counted back to
/// the latest redirect (or the start of the chain).
pub fn consecutive_errors(history: &[RequestHistory]) -> usize {
    history
        .iter()
        .rev()
        .take_while(|h| !h.is_redirect())
        .count()
}

impl Retry {
    /// Sleep before the next attempt: `backoff_factor * 2^(n-1)` capped at
    /// `backoff_max`, where `n` is the run of consecutive errors. Zero for
    /// the first retry of a run.
    pub fn get_backoff_time(&self) -> Duration {
        let n = consecutive_errors(&self.history);
        if n <= 1 || self.backoff_factor == 0.0 {
            return Duration::ZERO;
        }
        // powi saturates to infinity on long runs; the cap absorbs it.
        let exp = i32::try_from(n - 1).unwrap_or(i32::MAX);
        let raw = self.backoff_factor * 2f64.powi(exp);
        let max = self.backoff_max.as_secs_f64();
        Duration::try_from_secs_f64(raw.min(max)).unwrap_or(self.backoff_max)
    }
}
