//! One entry of a retry chain's history.

use super::error::AttemptError;

/// A completed attempt, as recorded by `Retry::increment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHistory {
    pub method: String,
    pub url: String,
    /// Transport error of the attempt, if it failed before a response.
    pub error: Option<AttemptError>,
    /// Status of the response, if there was one.
    pub status: Option<u16>,
    /// `Location` of a redirect response.
    pub redirect_location: Option<String>,
}

impl RequestHistory {
    pub fn is_redirect(&self) -> bool {
        self.redirect_location.is_some()
    }
}
