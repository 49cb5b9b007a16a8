//! The view of an HTTP response the retry engine needs.

/// Statuses whose `Location` header is followed as a redirect.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Response of one attempt, as seen by the retry policy.
///
/// Implement this for your client's response type; `ResponseInfo` is a
/// plain owned implementation.
pub trait RetryResponse {
    /// HTTP status code.
    fn status(&self) -> u16;

    /// Header value by name. Lookup must be case-insensitive.
    fn header(&self, name: &str) -> Option<&str>;

    /// Redirect target, if this response is a redirect.
    fn redirect_location(&self) -> Option<&str> {
        if REDIRECT_STATUSES.contains(&self.status()) {
            self.header("location")
        } else {
            None
        }
    }
}

/// Status plus headers, owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseInfo {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseInfo {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl RetryResponse for ResponseInfo {
    fn status(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
    }
}
