//! Retry and backoff policy.
//!
//! `Retry` carries both the configuration and the remaining budget of one
//! retry chain. After each failed or retryable attempt the caller asks
//! `Retry::increment` for the next state (or a terminal error) and waits
//! `Retry::sleep` before trying again. `run_with_retry` packages that loop.

mod backoff;
mod budget;
mod classify;
mod error;
mod history;
mod increment;
mod policy;
mod response;
mod retry_after;
mod run;
mod sleep;

pub use backoff::consecutive_errors;
pub use budget::{Budget, ParseBudgetError};
pub use classify::{is_connection_error, is_read_error};
pub use error::{AttemptError, MaxRetryReason, RetryError};
pub use history::RequestHistory;
pub use policy::{
    Retry, RetryBuilder, RetryOverrides, RetrySetting, DEFAULT_ALLOWED_METHODS,
    DEFAULT_BACKOFF_MAX, DEFAULT_REDIRECT, DEFAULT_REMOVE_HEADERS_ON_REDIRECT, DEFAULT_RETRY,
    DEFAULT_TOTAL, RETRY_AFTER_STATUS_CODES,
};
pub use response::{ResponseInfo, RetryResponse, REDIRECT_STATUSES};
pub use retry_after::{parse_retry_after, parse_retry_after_at, RETRY_AFTER_HEADER};
pub use run::{run_with_retry, AttemptRequest};
pub use sleep::{Sleeper, ThreadSleeper};
