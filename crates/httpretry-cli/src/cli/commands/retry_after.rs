//! `httpretry retry-after` – parse a Retry-After header value.

use anyhow::Result;
use httpretry_core::retry::parse_retry_after;

pub fn run_retry_after(value: &str) -> Result<()> {
    let wait = parse_retry_after(value)?;
    println!("{:.3}", wait.as_secs_f64());
    Ok(())
}
