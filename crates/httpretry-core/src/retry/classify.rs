//! Classify attempt failures and decide whether an outcome is retry-eligible.

use super::error::AttemptError;
use super::policy::{Retry, RETRY_AFTER_STATUS_CODES};

/// True for failures before the request reached the server (connect timeout,
/// refused connection), looking through a proxy error to its cause.
pub fn is_connection_error(err: &AttemptError) -> bool {
    match err {
        AttemptError::ConnectTimeout(_) | AttemptError::NewConnection(_) => true,
        AttemptError::Proxy { cause, .. } => is_connection_error(cause),
        _ => false,
    }
}

/// True for failures after the request may have been sent (read timeout,
/// protocol error). Such retries are only safe for allowed methods.
pub fn is_read_error(err: &AttemptError) -> bool {
    matches!(
        err,
        AttemptError::ReadTimeout(_) | AttemptError::Protocol(_)
    )
}

impl Retry {
    /// Whether `method` may be retried. Case-insensitive; an absent or empty
    /// allow-list allows every method.
    pub fn is_method_retryable(&self, method: &str) -> bool {
        match &self.allowed_methods {
            Some(allowed) if !allowed.is_empty() => {
                allowed.contains(&method.to_ascii_uppercase())
            }
            _ => true,
        }
    }

    /// Whether a response with `status_code` should be retried.
    ///
    /// Forced statuses always qualify. Otherwise only statuses that carry a
    /// honoured `Retry-After` qualify, and only while `total` has a count left.
    pub fn is_retry(&self, method: &str, status_code: u16, has_retry_after: bool) -> bool {
        if !self.is_method_retryable(method) {
            return false;
        }
        if !self.status_forcelist.is_empty() && self.status_forcelist.contains(&status_code) {
            return true;
        }
        self.total.is_truthy()
            && self.respect_retry_after_header
            && has_retry_after
            && RETRY_AFTER_STATUS_CODES.contains(&status_code)
    }

    /// True when any budget has gone below zero.
    pub fn is_exhausted(&self) -> bool {
        [
            self.total,
            self.connect,
            self.read,
            self.redirect,
            self.status,
            self.other,
        ]
        .iter()
        .any(|b| b.is_negative())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::budget::Budget;

    #[test]
    fn connect_class_errors() {
        assert!(is_connection_error(&AttemptError::ConnectTimeout("x".into())));
        assert!(is_connection_error(&AttemptError::NewConnection("refused".into())));
        assert!(is_connection_error(&AttemptError::proxy(
            "tunnel",
            AttemptError::ConnectTimeout("x".into())
        )));
        assert!(!is_connection_error(&AttemptError::ReadTimeout("x".into())));
        assert!(!is_connection_error(&AttemptError::proxy(
            "tunnel",
            AttemptError::Other("x".into())
        )));
    }

    #[test]
    fn read_class_errors() {
        assert!(is_read_error(&AttemptError::ReadTimeout("x".into())));
        assert!(is_read_error(&AttemptError::Protocol("reset".into())));
        assert!(!is_read_error(&AttemptError::ConnectTimeout("x".into())));
        assert!(!is_read_error(&AttemptError::Other("x".into())));
    }

    #[test]
    fn default_methods_are_idempotent_only() {
        let r = Retry::default();
        assert!(r.is_method_retryable("GET"));
        assert!(r.is_method_retryable("get"));
        assert!(!r.is_method_retryable("POST"));
        assert!(!r.is_method_retryable("PATCH"));
    }

    #[test]
    fn no_allow_list_allows_everything() {
        let r = Retry::builder().allowed_methods(None::<Vec<String>>).build();
        assert!(r.is_method_retryable("POST"));
        let r = Retry::builder().allowed_methods(Some(Vec::<String>::new())).build();
        assert!(r.is_method_retryable("POST"));
    }

    #[test]
    fn forcelist_statuses_are_retried() {
        let r = Retry::builder().status_forcelist([500, 502]).build();
        assert!(r.is_retry("GET", 502, false));
        assert!(!r.is_retry("GET", 404, false));
        assert!(!r.is_retry("POST", 502, false));
    }

    #[test]
    fn retry_after_statuses_need_header_and_total() {
        let r = Retry::default();
        assert!(r.is_retry("GET", 429, true));
        assert!(r.is_retry("GET", 503, true));
        assert!(r.is_retry("GET", 413, true));
        assert!(!r.is_retry("GET", 429, false));
        assert!(!r.is_retry("GET", 500, true));

        let r = Retry::builder().respect_retry_after_header(false).build();
        assert!(!r.is_retry("GET", 429, true));

        let r = Retry::builder().total(Budget::Unlimited).build();
        assert!(!r.is_retry("GET", 429, true));

        let r = Retry::new(0);
        assert!(!r.is_retry("GET", 429, true));
    }

    // 413 Payload Too Large is the status that carries Retry-After in
    // practice; 423 Locked does not and is left to the forcelist.
    #[test]
    fn retry_after_applies_to_payload_too_large_not_locked() {
        assert_eq!(RETRY_AFTER_STATUS_CODES, [413, 429, 503]);
        let r = Retry::default();
        assert!(r.is_retry("PUT", 413, true));
        assert!(!r.is_retry("PUT", 423, true));
        let r = Retry::builder().status_forcelist([423]).build();
        assert!(r.is_retry("PUT", 423, false));
    }

    #[test]
    fn unlimited_policy_is_never_exhausted() {
        let r = Retry::builder().total(Budget::Unlimited).build();
        assert!(!r.is_exhausted());
    }

    #[test]
    fn exhaustion_is_any_negative_budget() {
        assert!(!Retry::new(0).is_exhausted());
        assert!(Retry::new(-1).is_exhausted());
        assert!(Retry::builder().read(-1).build().is_exhausted());
        assert!(!Retry::builder().read(Budget::Disabled).build().is_exhausted());
    }
}
