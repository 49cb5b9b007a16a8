//! `Retry-After` header parsing.
//!
//! The header is either a number of seconds or an HTTP-date. Dates are tried
//! as RFC 2822 first, then the two obsolete HTTP-date forms (RFC 850 and
//! asctime). A date without a zone is taken as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::{Duration, SystemTime};

use super::error::RetryError;
use super::policy::Retry;
use super::response::RetryResponse;

pub const RETRY_AFTER_HEADER: &str = "Retry-After";

/// Seconds to wait according to a `Retry-After` value, relative to now.
pub fn parse_retry_after(value: &str) -> Result<Duration, RetryError> {
    parse_retry_after_at(value, SystemTime::now())
}

/// Same as `parse_retry_after` with an explicit current time.
/// Dates in the past give zero.
pub fn parse_retry_after_at(value: &str, now: SystemTime) -> Result<Duration, RetryError> {
    let invalid = || RetryError::InvalidHeader(value.to_string());
    let trimmed = value.trim();

    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        // Only overflow can fail here.
        let secs = trimmed.parse::<u64>().unwrap_or(u64::MAX);
        return Ok(Duration::from_secs(secs));
    }

    let when = parse_http_date(trimmed).ok_or_else(invalid)?;
    let now: DateTime<Utc> = now.into();
    Ok((when - now).to_std().unwrap_or(Duration::ZERO))
}

fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&format!("{} +0000", s)) {
        return Some(dt.with_timezone(&Utc));
    }
    // RFC 850: "Sunday, 06-Nov-94 08:49:37 GMT"
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%A, %d-%b-%y %H:%M:%S GMT") {
        return Some(dt.and_utc());
    }
    // asctime: "Sun Nov  6 08:49:37 1994"
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%a %b %e %H:%M:%S %Y") {
        return Some(dt.and_utc());
    }
    None
}

impl Retry {
    /// Parsed `Retry-After` of `response`, or `None` if the header is absent.
    pub fn get_retry_after(
        &self,
        response: &dyn RetryResponse,
    ) -> Result<Option<Duration>, RetryError> {
        match response.header(RETRY_AFTER_HEADER) {
            None => Ok(None),
            Some(v) => parse_retry_after(v).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::response::ResponseInfo;

    /// Sun, 06 Nov 1994 08:49:37 GMT
    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(784_111_777)
    }

    #[test]
    fn integer_seconds() {
        assert_eq!(parse_retry_after("120").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_retry_after(" 5 ").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_retry_after("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn oversized_integer_saturates() {
        let d = parse_retry_after("99999999999999999999").unwrap();
        assert_eq!(d, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn garbage_is_invalid_header() {
        for v in ["not-a-number-or-date", "", "-5", "1.5", "12s"] {
            match parse_retry_after(v) {
                Err(RetryError::InvalidHeader(h)) => assert_eq!(h, v),
                other => panic!("expected InvalidHeader for {:?}, got {:?}", v, other),
            }
        }
    }

    #[test]
    fn http_date_in_the_future() {
        let d = parse_retry_after_at("Sun, 06 Nov 1994 08:50:37 GMT", now()).unwrap();
        assert_eq!(d, Duration::from_secs(60));
    }

    #[test]
    fn http_date_with_numeric_offset() {
        let d = parse_retry_after_at("Sun, 06 Nov 1994 09:50:37 +0100", now()).unwrap();
        assert_eq!(d, Duration::from_secs(60));
    }

    #[test]
    fn http_date_in_the_past_clamps_to_zero() {
        let d = parse_retry_after_at("Sun, 06 Nov 1994 08:00:00 GMT", now()).unwrap();
        assert_eq!(d, Duration::ZERO);
    }

    // Zone-less dates are read as UTC. This is a compatibility assumption,
    // not something HTTP-date grammar allows.
    #[test]
    fn http_date_without_zone_is_utc() {
        let d = parse_retry_after_at("Sun, 06 Nov 1994 08:50:37", now()).unwrap();
        assert_eq!(d, Duration::from_secs(60));
    }

    #[test]
    fn obsolete_http_date_forms() {
        let d = parse_retry_after_at("Sunday, 06-Nov-94 08:50:37 GMT", now()).unwrap();
        assert_eq!(d, Duration::from_secs(60));
        let d = parse_retry_after_at("Sun Nov  6 08:50:37 1994", now()).unwrap();
        assert_eq!(d, Duration::from_secs(60));
    }

    #[test]
    fn get_retry_after_reads_header() {
        let r = Retry::default();
        let resp = ResponseInfo::new(503).with_header("retry-after", "7");
        assert_eq!(r.get_retry_after(&resp).unwrap(), Some(Duration::from_secs(7)));

        let resp = ResponseInfo::new(503);
        assert_eq!(r.get_retry_after(&resp).unwrap(), None);

        let resp = ResponseInfo::new(503).with_header("Retry-After", "soon");
        assert!(r.get_retry_after(&resp).is_err());
    }
}
