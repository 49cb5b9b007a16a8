//! CLI for the httpretry policy engine.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use httpretry_core::config::{self, RetryConfig};
use httpretry_core::retry::Budget;

use commands::{run_backoff, run_completions, run_config, run_man, run_retry_after, run_simulate};

/// Top-level CLI for httpretry.
#[derive(Debug, Parser)]
#[command(name = "httpretry")]
#[command(about = "httpretry: inspect and simulate HTTP retry policies", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the backoff schedule for a run of consecutive errors.
    Backoff {
        /// Backoff factor in seconds (defaults to the configured value).
        #[arg(long)]
        factor: Option<f64>,
        /// Maximum backoff in seconds (defaults to the configured value).
        #[arg(long, value_name = "SECS")]
        max: Option<f64>,
        /// Number of consecutive errors to show.
        #[arg(long, default_value = "8", value_name = "N")]
        errors: usize,
    },

    /// Parse a Retry-After header value and print the wait in seconds.
    RetryAfter {
        /// Header value: seconds or an HTTP date.
        value: String,
    },

    /// Run a retry chain against scripted attempt outcomes.
    ///
    /// Outcomes: error:connect-timeout, error:new-connection, error:read-timeout,
    /// error:protocol, error:proxy, error:other, status:CODE[:RETRY_AFTER],
    /// redirect:CODE:LOCATION. Attempts past the end of the script get HTTP 200.
    Simulate {
        #[command(flatten)]
        policy: PolicyArgs,
        /// Request method.
        #[arg(long, default_value = "GET")]
        method: String,
        /// Request URL.
        #[arg(long, default_value = "https://example.com/")]
        url: String,
        /// Print a JSON report instead of text.
        #[arg(long)]
        json: bool,
        /// Actually wait between attempts instead of only reporting the waits.
        #[arg(long)]
        sleep: bool,
        /// Scripted attempt outcomes, in order.
        #[arg(required = true, value_name = "OUTCOME")]
        outcomes: Vec<String>,
    },

    /// Show the effective configuration (config file plus flags) as TOML.
    Config {
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff).
    Man,
}

/// Retry policy overrides shared by commands that build a policy.
#[derive(Debug, Clone, Default, Args)]
pub struct PolicyArgs {
    /// Total retry budget: a count, "unlimited" or "disabled".
    #[arg(long, value_name = "BUDGET")]
    pub total: Option<Budget>,
    /// Budget for connection errors.
    #[arg(long, value_name = "BUDGET")]
    pub connect: Option<Budget>,
    /// Budget for read errors.
    #[arg(long, value_name = "BUDGET")]
    pub read: Option<Budget>,
    /// Budget for redirects.
    #[arg(long, value_name = "BUDGET")]
    pub redirect: Option<Budget>,
    /// Budget for forced-status responses.
    #[arg(long, value_name = "BUDGET")]
    pub status: Option<Budget>,
    /// Budget for other errors.
    #[arg(long, value_name = "BUDGET")]
    pub other: Option<Budget>,
    /// Statuses to retry even though the server answered (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "CODES")]
    pub status_forcelist: Option<Vec<u16>>,
    /// Backoff factor in seconds.
    #[arg(long)]
    pub backoff_factor: Option<f64>,
    /// Maximum backoff in seconds.
    #[arg(long, value_name = "SECS")]
    pub backoff_max: Option<f64>,
    /// Retry every method, not only idempotent ones.
    #[arg(long)]
    pub all_methods: bool,
    /// Ignore Retry-After headers.
    #[arg(long)]
    pub ignore_retry_after: bool,
    /// Return the last response instead of failing when forced-status retries run out.
    #[arg(long)]
    pub no_raise_on_status: bool,
    /// Return the last redirect instead of failing when redirects run out.
    #[arg(long)]
    pub no_raise_on_redirect: bool,
}

impl PolicyArgs {
    /// Layer these flags over a configured retry section.
    pub fn apply(&self, mut cfg: RetryConfig) -> RetryConfig {
        let budgets = [
            (self.total, &mut cfg.total),
            (self.connect, &mut cfg.connect),
            (self.read, &mut cfg.read),
            (self.redirect, &mut cfg.redirect),
            (self.status, &mut cfg.status),
            (self.other, &mut cfg.other),
        ];
        for (flag, slot) in budgets {
            if let Some(b) = flag {
                *slot = b;
            }
        }
        if let Some(codes) = &self.status_forcelist {
            cfg.status_forcelist = codes.clone();
        }
        if let Some(f) = self.backoff_factor {
            cfg.backoff_factor = f;
        }
        if let Some(m) = self.backoff_max {
            cfg.backoff_max_secs = m;
        }
        if self.all_methods {
            cfg.allowed_methods = Some(Vec::new());
        }
        if self.ignore_retry_after {
            cfg.respect_retry_after_header = false;
        }
        if self.no_raise_on_status {
            cfg.raise_on_status = false;
        }
        if self.no_raise_on_redirect {
            cfg.raise_on_redirect = false;
        }
        cfg
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Backoff {
                factor,
                max,
                errors,
            } => {
                let cfg = load_retry_config()?;
                run_backoff(&cfg, factor, max, errors)?;
            }
            CliCommand::RetryAfter { value } => run_retry_after(&value)?,
            CliCommand::Simulate {
                policy,
                method,
                url,
                json,
                sleep,
                outcomes,
            } => {
                let cfg = policy.apply(load_retry_config()?);
                run_simulate(&cfg, &method, &url, &outcomes, json, sleep)?;
            }
            CliCommand::Config { policy } => {
                let cfg = policy.apply(load_retry_config()?);
                run_config(cfg)?;
            }
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

fn load_retry_config() -> Result<RetryConfig> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg.retry_config())
}

#[cfg(test)]
mod tests;
