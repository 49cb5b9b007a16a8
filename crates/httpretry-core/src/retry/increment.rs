//! The retry state transition.

use super::classify::{is_connection_error, is_read_error};
use super::error::{AttemptError, MaxRetryReason, RetryError};
use super::history::RequestHistory;
use super::policy::{Retry, RetryOverrides};
use super::response::RetryResponse;

const CAUSE_UNKNOWN: &str = "unknown";
const CAUSE_REDIRECTS: &str = "too many redirects";

impl Retry {
    /// Account for one failed or retryable attempt and return the next policy.
    ///
    /// Pass the transport `error` if the attempt failed, otherwise the
    /// `response` that is being retried. `pool` names the connection pool or
    /// host for the exhaustion error.
    ///
    /// Returns the attempt's own error when the policy refuses to retry that
    /// kind of failure, and `RetryError::MaxRetries` once any budget is spent.
    pub fn increment(
        &self,
        method: &str,
        url: &str,
        response: Option<&dyn RetryResponse>,
        error: Option<AttemptError>,
        pool: Option<&str>,
    ) -> Result<Retry, RetryError> {
        if self.total.is_disabled() {
            if let Some(err) = error {
                return Err(RetryError::Attempt(err));
            }
        }

        let total = self.total.decrement();
        let mut connect = self.connect;
        let mut read = self.read;
        let mut redirect = self.redirect;
        let mut status_count = self.status;
        let mut other = self.other;

        let mut cause = CAUSE_UNKNOWN.to_string();
        let mut status = None;
        let mut redirect_location = None;

        match (&error, response) {
            (Some(err), _) if is_connection_error(err) => {
                if connect.is_disabled() {
                    return Err(RetryError::Attempt(err.clone()));
                }
                connect = connect.decrement();
            }
            (Some(err), _) if is_read_error(err) => {
                if read.is_disabled() || !self.is_method_retryable(method) {
                    return Err(RetryError::Attempt(err.clone()));
                }
                read = read.decrement();
            }
            (Some(_), _) => {
                other = other.decrement();
            }
            (None, Some(resp)) => {
                if let Some(location) = resp.redirect_location() {
                    redirect = redirect.decrement();
                    cause = CAUSE_REDIRECTS.to_string();
                    redirect_location = Some(location.to_string());
                } else if self.status_forcelist.contains(&resp.status()) {
                    status_count = status_count.decrement();
                    cause = format!("too many {} error responses", resp.status());
                }
                status = Some(resp.status());
            }
            (None, None) => {}
        }

        let mut history = self.history.clone();
        history.push(RequestHistory {
            method: method.to_string(),
            url: url.to_string(),
            error: error.clone(),
            status,
            redirect_location,
        });

        let next = self.clone_with(RetryOverrides {
            total: Some(total),
            connect: Some(connect),
            read: Some(read),
            redirect: Some(redirect),
            status: Some(status_count),
            other: Some(other),
            history: Some(history),
        });

        if next.is_exhausted() {
            let reason = match error {
                Some(err) => MaxRetryReason::Error(err),
                None => MaxRetryReason::Response(cause),
            };
            return Err(RetryError::MaxRetries {
                pool: pool.map(str::to_string),
                url: url.to_string(),
                reason,
            });
        }

        tracing::debug!(
            url,
            total = %next.total,
            attempts = next.history.len(),
            "incremented retry"
        );
        Ok(next)
    }
}
