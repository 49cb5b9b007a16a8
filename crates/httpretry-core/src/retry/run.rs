//! Retry loop: send a request until it succeeds or the policy says stop.

use url::Url;

use super::error::{AttemptError, RetryError};
use super::policy::Retry;
use super::response::RetryResponse;
use super::retry_after::RETRY_AFTER_HEADER;
use super::sleep::Sleeper;

/// The request as the next attempt should send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl AttemptRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Runs `send` until it returns a response the policy accepts.
///
/// Transport errors and retryable responses go through `Retry::increment`
/// and the policy's sleep. Redirects are followed, with sensitive headers
/// dropped when the host changes. Returns the final response together with
/// the policy state that produced it.
///
/// When retries run out on a redirect or a retryable status, the last
/// response is returned instead of an error if `raise_on_redirect` /
/// `raise_on_status` is off.
pub fn run_with_retry<R, F, S>(
    retry: &Retry,
    request: AttemptRequest,
    sleeper: &S,
    pool: Option<&str>,
    mut send: F,
) -> Result<(R, Retry), RetryError>
where
    R: RetryResponse,
    F: FnMut(&AttemptRequest) -> Result<R, AttemptError>,
    S: Sleeper + ?Sized,
{
    let mut retries = retry.clone();
    let mut request = request;

    loop {
        let response = match send(&request) {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "attempt failed");
                retries =
                    retries.increment(&request.method, &request.url, None, Some(err), pool)?;
                retries.sleep(None, sleeper)?;
                continue;
            }
        };

        if let Some(location) = response.redirect_location() {
            let next = match resolve_location(&request.url, location) {
                Some(next) => next,
                None => {
                    tracing::warn!(location, "cannot resolve redirect location; not following");
                    return Ok((response, retries));
                }
            };
            match retries.increment(&request.method, &request.url, Some(&response), None, pool) {
                Ok(r) => retries = r,
                Err(e) if e.is_max_retries() && !retries.raise_on_redirect() => {
                    return Ok((response, retries));
                }
                Err(e) => return Err(e),
            }
            tracing::info!(
                from = %request.url,
                to = %next,
                status = response.status(),
                "following redirect"
            );

            if response.status() == 303 {
                request.method = "GET".to_string();
            }
            if !same_host(&request.url, &next) {
                let strip = retries.remove_headers_on_redirect();
                request
                    .headers
                    .retain(|(name, _)| !strip.contains(&name.trim().to_ascii_lowercase()));
            }
            request.url = next;
            retries.sleep_for_retry(&response, sleeper)?;
            continue;
        }

        let has_retry_after = response.header(RETRY_AFTER_HEADER).is_some();
        if retries.is_retry(&request.method, response.status(), has_retry_after) {
            match retries.increment(&request.method, &request.url, Some(&response), None, pool) {
                Ok(r) => retries = r,
                Err(e) if e.is_max_retries() && !retries.raise_on_status() => {
                    return Ok((response, retries));
                }
                Err(e) => return Err(e),
            }
            tracing::info!(url = %request.url, status = response.status(), "retrying response");
            retries.sleep(Some(&response), sleeper)?;
            continue;
        }

        return Ok((response, retries));
    }
}

/// Absolute URL of a `Location` value, relative to the request URL.
fn resolve_location(current: &str, location: &str) -> Option<String> {
    match Url::parse(location) {
        Ok(u) => Some(u.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(current)
            .and_then(|base| base.join(location))
            .ok()
            .map(|u| u.to_string()),
        Err(_) => None,
    }
}

fn same_host(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a.host_str() == b.host_str(),
        _ => false,
    }
}
