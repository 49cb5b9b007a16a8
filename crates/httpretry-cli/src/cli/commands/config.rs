//! `httpretry config` – show the effective configuration.

use anyhow::Result;
use httpretry_core::config::{self, Config, RetryConfig};

pub fn run_config(retry: RetryConfig) -> Result<()> {
    // Validate before printing so a bad file or flag is reported here.
    retry.to_retry()?;
    let cfg = Config { retry: Some(retry) };
    println!("# {}", config::config_path()?.display());
    print!("{}", toml::to_string_pretty(&cfg)?);
    Ok(())
}
