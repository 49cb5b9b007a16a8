//! `httpretry backoff` – print the backoff schedule of a policy.

use anyhow::Result;
use httpretry_core::config::RetryConfig;
use httpretry_core::retry::{AttemptError, Budget};

/// Feed `errors` consecutive failures through the policy and print the wait
/// before each retry.
pub fn run_backoff(
    cfg: &RetryConfig,
    factor: Option<f64>,
    max: Option<f64>,
    errors: usize,
) -> Result<()> {
    let mut cfg = cfg.clone();
    cfg.total = Budget::Unlimited;
    cfg.other = Budget::Unlimited;
    if let Some(f) = factor {
        cfg.backoff_factor = f;
    }
    if let Some(m) = max {
        cfg.backoff_max_secs = m;
    }

    let mut retry = cfg.to_retry()?;
    println!("{:<8} {}", "ERRORS", "WAIT(s)");
    for n in 1..=errors {
        retry = retry.increment(
            "GET",
            "/",
            None,
            Some(AttemptError::Other("scripted".into())),
            None,
        )?;
        println!("{:<8} {:.3}", n, retry.get_backoff_time().as_secs_f64());
    }
    Ok(())
}
