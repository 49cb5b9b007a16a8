//! Waiting between attempts.
//!
//! The engine decides how long to wait; a `Sleeper` does the waiting so tests
//! and async callers can substitute their own.

use std::time::Duration;

use super::error::RetryError;
use super::policy::Retry;
use super::response::RetryResponse;

/// Blocks the caller for a duration.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread. Zero durations return immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<F> Sleeper for F
where
    F: Fn(Duration),
{
    fn sleep(&self, duration: Duration) {
        self(duration)
    }
}

impl Retry {
    /// Positive `Retry-After` delay of `response`, if it is honoured.
    fn retry_after_delay(
        &self,
        response: &dyn RetryResponse,
    ) -> Result<Option<Duration>, RetryError> {
        if !self.respect_retry_after_header {
            return Ok(None);
        }
        Ok(self.get_retry_after(response)?.filter(|d| !d.is_zero()))
    }

    /// Sleep for the server's `Retry-After`, if there is one to honour.
    /// Returns whether it slept.
    pub fn sleep_for_retry<S>(
        &self,
        response: &dyn RetryResponse,
        sleeper: &S,
    ) -> Result<bool, RetryError>
    where
        S: Sleeper + ?Sized,
    {
        match self.retry_after_delay(response)? {
            Some(d) => {
                tracing::debug!(seconds = d.as_secs_f64(), "sleeping for Retry-After");
                sleeper.sleep(d);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// How long `sleep` would wait: the honoured `Retry-After` of `response`
    /// if any, otherwise the backoff time.
    pub fn planned_sleep(
        &self,
        response: Option<&dyn RetryResponse>,
    ) -> Result<Duration, RetryError> {
        if let Some(resp) = response {
            if let Some(d) = self.retry_after_delay(resp)? {
                return Ok(d);
            }
        }
        Ok(self.get_backoff_time())
    }

    /// Wait before the next attempt.
    ///
    /// The sleeper is called on the backoff path even when the backoff is
    /// zero.
    pub fn sleep<S>(
        &self,
        response: Option<&dyn RetryResponse>,
        sleeper: &S,
    ) -> Result<(), RetryError>
    where
        S: Sleeper + ?Sized,
    {
        if let Some(resp) = response {
            if self.sleep_for_retry(resp, sleeper)? {
                return Ok(());
            }
        }
        let backoff = self.get_backoff_time();
        tracing::debug!(seconds = backoff.as_secs_f64(), "sleeping for backoff");
        sleeper.sleep(backoff);
        Ok(())
    }

    /// `sleep` for callers on a tokio runtime.
    pub async fn sleep_async(
        &self,
        response: Option<&dyn RetryResponse>,
    ) -> Result<(), RetryError> {
        let d = self.planned_sleep(response)?;
        tokio::time::sleep(d).await;
        Ok(())
    }
}
