//! CLI command handlers. Each command is in its own file.

mod backoff;
mod completions;
mod config;
mod retry_after;
mod simulate;

pub use backoff::run_backoff;
pub use completions::{run_completions, run_man};
pub use config::run_config;
pub use retry_after::run_retry_after;
pub use simulate::run_simulate;

#[cfg(test)]
pub(crate) use simulate::parse_outcome;
