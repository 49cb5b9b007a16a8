//! The retry policy value and its construction.
//!
//! A `Retry` is both configuration and the remaining budget of one retry
//! chain. It is never mutated in place: `increment` returns the next value.

use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

use super::budget::Budget;
use super::history::RequestHistory;

/// Methods retried by default: the idempotent ones.
pub const DEFAULT_ALLOWED_METHODS: [&str; 6] =
    ["DELETE", "GET", "HEAD", "OPTIONS", "PUT", "TRACE"];

/// Statuses that may carry a `Retry-After` worth honouring.
pub const RETRY_AFTER_STATUS_CODES: [u16; 3] = [413, 429, 503];

/// Headers dropped when a redirect leads to another host.
pub const DEFAULT_REMOVE_HEADERS_ON_REDIRECT: [&str; 2] = ["authorization", "cookie"];

/// Upper bound on a single backoff sleep unless configured otherwise.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Total budget when only a policy shape is given.
pub const DEFAULT_TOTAL: i64 = 10;

/// Redirect budget of the process-wide default.
pub const DEFAULT_REDIRECT: i64 = 5;

/// Process-wide default policy, used by `Retry::from_int` when no count is given.
pub static DEFAULT_RETRY: LazyLock<Retry> = LazyLock::new(Retry::default);

/// Retry configuration plus the remaining budgets of one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Retry {
    pub(super) total: Budget,
    pub(super) connect: Budget,
    pub(super) read: Budget,
    pub(super) redirect: Budget,
    pub(super) status: Budget,
    pub(super) other: Budget,
    pub(super) allowed_methods: Option<BTreeSet<String>>,
    pub(super) status_forcelist: BTreeSet<u16>,
    pub(super) backoff_factor: f64,
    pub(super) backoff_max: Duration,
    pub(super) raise_on_redirect: bool,
    pub(super) raise_on_status: bool,
    pub(super) history: Vec<RequestHistory>,
    pub(super) respect_retry_after_header: bool,
    pub(super) remove_headers_on_redirect: BTreeSet<String>,
}

/// Total 10, redirect 5, read errors never retried.
impl Default for Retry {
    fn default() -> Self {
        Retry::builder()
            .read(Budget::Disabled)
            .redirect(Budget::Remaining(DEFAULT_REDIRECT))
            .build()
    }
}

impl Retry {
    /// Policy with the given total budget and builder defaults elsewhere.
    pub fn new(total: impl Into<Budget>) -> Self {
        Retry::builder().total(total).build()
    }

    pub fn builder() -> RetryBuilder {
        RetryBuilder::default()
    }

    /// Normalize a retries argument into a policy.
    ///
    /// `None` falls back to `default`, then to `DEFAULT_RETRY`. A policy is
    /// returned unchanged. A bare total builds a fresh policy whose redirect
    /// budget is unlimited when `redirect` is true and disabled otherwise.
    pub fn from_int(
        retries: Option<RetrySetting>,
        redirect: bool,
        default: Option<RetrySetting>,
    ) -> Retry {
        let retries = retries
            .or(default)
            .unwrap_or_else(|| RetrySetting::Policy(DEFAULT_RETRY.clone()));
        match retries {
            RetrySetting::Policy(r) => r,
            RetrySetting::Total(total) => {
                let redirect = if redirect {
                    Budget::Unlimited
                } else {
                    Budget::Disabled
                };
                Retry::builder().total(total).redirect(redirect).build()
            }
        }
    }

    /// Copy of this policy with some fields replaced. Construction
    /// normalization runs again on the result.
    pub fn clone_with(&self, overrides: RetryOverrides) -> Retry {
        let mut b = self.to_builder();
        if let Some(v) = overrides.total {
            b.total = v;
        }
        if let Some(v) = overrides.connect {
            b.connect = v;
        }
        if let Some(v) = overrides.read {
            b.read = v;
        }
        if let Some(v) = overrides.redirect {
            b.redirect = v;
        }
        if let Some(v) = overrides.status {
            b.status = v;
        }
        if let Some(v) = overrides.other {
            b.other = v;
        }
        if let Some(v) = overrides.history {
            b.history = v;
        }
        b.build()
    }

    /// Builder pre-filled with this policy's fields.
    pub fn to_builder(&self) -> RetryBuilder {
        RetryBuilder {
            total: self.total,
            connect: self.connect,
            read: self.read,
            redirect: self.redirect,
            status: self.status,
            other: self.other,
            allowed_methods: self.allowed_methods.clone(),
            status_forcelist: self.status_forcelist.clone(),
            backoff_factor: self.backoff_factor,
            backoff_max: self.backoff_max,
            raise_on_redirect: self.raise_on_redirect,
            raise_on_status: self.raise_on_status,
            history: self.history.clone(),
            respect_retry_after_header: self.respect_retry_after_header,
            remove_headers_on_redirect: self.remove_headers_on_redirect.clone(),
        }
    }

    pub fn total(&self) -> Budget {
        self.total
    }

    pub fn connect(&self) -> Budget {
        self.connect
    }

    pub fn read(&self) -> Budget {
        self.read
    }

    pub fn redirect(&self) -> Budget {
        self.redirect
    }

    pub fn status(&self) -> Budget {
        self.status
    }

    pub fn other(&self) -> Budget {
        self.other
    }

    /// Remaining budgets as `(name, budget)` pairs, in a fixed order.
    pub fn budgets(&self) -> [(&'static str, Budget); 6] {
        [
            ("total", self.total),
            ("connect", self.connect),
            ("read", self.read),
            ("redirect", self.redirect),
            ("status", self.status),
            ("other", self.other),
        ]
    }

    /// Upper-cased methods eligible for retry; `None` means every method.
    pub fn allowed_methods(&self) -> Option<&BTreeSet<String>> {
        self.allowed_methods.as_ref()
    }

    pub fn status_forcelist(&self) -> &BTreeSet<u16> {
        &self.status_forcelist
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn backoff_max(&self) -> Duration {
        self.backoff_max
    }

    pub fn raise_on_redirect(&self) -> bool {
        self.raise_on_redirect
    }

    pub fn raise_on_status(&self) -> bool {
        self.raise_on_status
    }

    /// Attempts recorded so far, oldest first.
    pub fn history(&self) -> &[RequestHistory] {
        &self.history
    }

    pub fn respect_retry_after_header(&self) -> bool {
        self.respect_retry_after_header
    }

    /// Lower-cased header names to drop on a cross-host redirect.
    pub fn remove_headers_on_redirect(&self) -> &BTreeSet<String> {
        &self.remove_headers_on_redirect
    }
}

/// A retries argument: either a ready policy or just a total budget.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrySetting {
    Policy(Retry),
    Total(Budget),
}

impl From<Retry> for RetrySetting {
    fn from(r: Retry) -> Self {
        RetrySetting::Policy(r)
    }
}

impl From<Budget> for RetrySetting {
    fn from(b: Budget) -> Self {
        RetrySetting::Total(b)
    }
}

impl From<i32> for RetrySetting {
    fn from(n: i32) -> Self {
        RetrySetting::Total(Budget::from(n))
    }
}

/// Fields `Retry::clone_with` may replace; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct RetryOverrides {
    pub total: Option<Budget>,
    pub connect: Option<Budget>,
    pub read: Option<Budget>,
    pub redirect: Option<Budget>,
    pub status: Option<Budget>,
    pub other: Option<Budget>,
    pub history: Option<Vec<RequestHistory>>,
}

/// Builder for `Retry`. Defaults: total 10, every other budget unlimited,
/// idempotent methods only, no forced statuses, no backoff, 120s cap.
#[derive(Debug, Clone)]
pub struct RetryBuilder {
    total: Budget,
    connect: Budget,
    read: Budget,
    redirect: Budget,
    status: Budget,
    other: Budget,
    allowed_methods: Option<BTreeSet<String>>,
    status_forcelist: BTreeSet<u16>,
    backoff_factor: f64,
    backoff_max: Duration,
    raise_on_redirect: bool,
    raise_on_status: bool,
    history: Vec<RequestHistory>,
    respect_retry_after_header: bool,
    remove_headers_on_redirect: BTreeSet<String>,
}

impl Default for RetryBuilder {
    fn default() -> Self {
        Self {
            total: Budget::Remaining(DEFAULT_TOTAL),
            connect: Budget::Unlimited,
            read: Budget::Unlimited,
            redirect: Budget::Unlimited,
            status: Budget::Unlimited,
            other: Budget::Unlimited,
            allowed_methods: Some(
                DEFAULT_ALLOWED_METHODS
                    .iter()
                    .map(|m| m.to_string())
                    .collect(),
            ),
            status_forcelist: BTreeSet::new(),
            backoff_factor: 0.0,
            backoff_max: DEFAULT_BACKOFF_MAX,
            raise_on_redirect: true,
            raise_on_status: true,
            history: Vec::new(),
            respect_retry_after_header: true,
            remove_headers_on_redirect: DEFAULT_REMOVE_HEADERS_ON_REDIRECT
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

impl RetryBuilder {
    pub fn total(mut self, v: impl Into<Budget>) -> Self {
        self.total = v.into();
        self
    }

    pub fn connect(mut self, v: impl Into<Budget>) -> Self {
        self.connect = v.into();
        self
    }

    pub fn read(mut self, v: impl Into<Budget>) -> Self {
        self.read = v.into();
        self
    }

    pub fn redirect(mut self, v: impl Into<Budget>) -> Self {
        self.redirect = v.into();
        self
    }

    pub fn status(mut self, v: impl Into<Budget>) -> Self {
        self.status = v.into();
        self
    }

    pub fn other(mut self, v: impl Into<Budget>) -> Self {
        self.other = v.into();
        self
    }

    /// Methods eligible for retry. Pass `None` to allow every method.
    pub fn allowed_methods<I, S>(mut self, methods: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_methods = methods.map(|m| m.into_iter().map(Into::into).collect());
        self
    }

    pub fn status_forcelist(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.status_forcelist = statuses.into_iter().collect();
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn backoff_max(mut self, max: Duration) -> Self {
        self.backoff_max = max;
        self
    }

    pub fn raise_on_redirect(mut self, v: bool) -> Self {
        self.raise_on_redirect = v;
        self
    }

    pub fn raise_on_status(mut self, v: bool) -> Self {
        self.raise_on_status = v;
        self
    }

    pub fn history(mut self, history: Vec<RequestHistory>) -> Self {
        self.history = history;
        self
    }

    pub fn respect_retry_after_header(mut self, v: bool) -> Self {
        self.respect_retry_after_header = v;
        self
    }

    pub fn remove_headers_on_redirect<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_headers_on_redirect = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(self) -> Retry {
        let mut redirect = self.redirect;
        let mut raise_on_redirect = self.raise_on_redirect;
        // Disabling redirects (or everything) still counts them, just with no
        // room: the first redirect exhausts the policy without raising.
        if redirect.is_disabled() || self.total.is_disabled() {
            redirect = Budget::Remaining(0);
            raise_on_redirect = false;
        }

        // `max` also maps NaN to zero.
        let backoff_factor = self.backoff_factor.max(0.0);

        Retry {
            total: self.total,
            connect: self.connect,
            read: self.read,
            redirect,
            status: self.status,
            other: self.other,
            allowed_methods: self
                .allowed_methods
                .map(|m| m.into_iter().map(|s| s.to_ascii_uppercase()).collect()),
            status_forcelist: self.status_forcelist,
            backoff_factor,
            backoff_max: self.backoff_max,
            raise_on_redirect,
            raise_on_status: self.raise_on_status,
            history: self.history,
            respect_retry_after_header: self.respect_retry_after_header,
            remove_headers_on_redirect: self
                .remove_headers_on_redirect
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }
}
