//! Transport error taxonomy and retry engine errors.

use std::fmt;

/// Error reported by one HTTP attempt (the networking layer's failure kinds).
///
/// The engine only needs to tell connect failures from read failures; the
/// message is kept for history and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Timed out while establishing the connection.
    ConnectTimeout(String),
    /// Could not open a new connection (refused, DNS failure, ...).
    /// Treated like a connect timeout: the request never reached the server.
    NewConnection(String),
    /// Timed out waiting for the response.
    ReadTimeout(String),
    /// Connection dropped mid-response, incomplete read, malformed reply.
    Protocol(String),
    /// Failure talking to a proxy; `cause` is what the proxy hop ran into.
    Proxy {
        message: String,
        cause: Box<AttemptError>,
    },
    /// Anything else (TLS, local I/O, ...).
    Other(String),
}

impl AttemptError {
    /// Wrap `cause` as a proxy failure.
    pub fn proxy(message: impl Into<String>, cause: AttemptError) -> Self {
        AttemptError::Proxy {
            message: message.into(),
            cause: Box::new(cause),
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::ConnectTimeout(m) => write!(f, "connect timeout: {}", m),
            AttemptError::NewConnection(m) => write!(f, "failed to establish connection: {}", m),
            AttemptError::ReadTimeout(m) => write!(f, "read timeout: {}", m),
            AttemptError::Protocol(m) => write!(f, "protocol error: {}", m),
            AttemptError::Proxy { message, cause } => {
                write!(f, "proxy error: {} ({})", message, cause)
            }
            AttemptError::Other(m) => write!(f, "{}", m),
        }
    }
}

impl std::error::Error for AttemptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttemptError::Proxy { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// Why a retry chain ran out of budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaxRetryReason {
    /// The last attempt failed with this transport error.
    Error(AttemptError),
    /// The last attempt got a response the policy retries on
    /// (e.g. "too many redirects", "too many 503 error responses").
    Response(String),
}

impl fmt::Display for MaxRetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxRetryReason::Error(e) => write!(f, "{}", e),
            MaxRetryReason::Response(cause) => write!(f, "{}", cause),
        }
    }
}

/// Errors surfaced by the retry engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetryError {
    /// The policy forbids retrying this kind of failure; this is the
    /// attempt's own error, unchanged.
    #[error(transparent)]
    Attempt(AttemptError),

    /// A budget went below zero.
    #[error("max retries exceeded with url: {url} (caused by {reason})")]
    MaxRetries {
        /// Connection pool / host the chain was running against, if known.
        pool: Option<String>,
        url: String,
        reason: MaxRetryReason,
    },

    /// `Retry-After` was neither a number of seconds nor an HTTP date.
    #[error("invalid Retry-After header: {0}")]
    InvalidHeader(String),
}

impl RetryError {
    /// Why retries ran out; `None` unless this is `MaxRetries`.
    pub fn reason(&self) -> Option<&MaxRetryReason> {
        match self {
            RetryError::MaxRetries { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_max_retries(&self) -> bool {
        matches!(self, RetryError::MaxRetries { .. })
    }

    /// The original attempt error when the policy vetoed a retry.
    pub fn into_attempt_error(self) -> Option<AttemptError> {
        match self {
            RetryError::Attempt(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn proxy_error_exposes_cause_as_source() {
        let e = AttemptError::proxy("tunnel failed", AttemptError::ConnectTimeout("10s".into()));
        let src = e.source().expect("proxy has a source");
        assert_eq!(src.to_string(), "connect timeout: 10s");
    }

    #[test]
    fn vetoed_error_displays_as_original() {
        let original = AttemptError::ReadTimeout("30s".into());
        let e = RetryError::Attempt(original.clone());
        assert_eq!(e.to_string(), original.to_string());
        assert_eq!(e.into_attempt_error(), Some(original));
    }

    #[test]
    fn max_retries_message_and_reason() {
        let e = RetryError::MaxRetries {
            pool: None,
            url: "/a".into(),
            reason: MaxRetryReason::Response("too many redirects".into()),
        };
        assert_eq!(
            e.to_string(),
            "max retries exceeded with url: /a (caused by too many redirects)"
        );
        assert!(e.is_max_retries());
        assert_eq!(
            e.reason(),
            Some(&MaxRetryReason::Response("too many redirects".into()))
        );
    }
}
