//! Tests for policy flags layered over config.

use super::parse;
use crate::cli::CliCommand;
use httpretry_core::config::RetryConfig;
use httpretry_core::retry::Budget;

#[test]
fn cli_parse_policy_flags() {
    match parse(&[
        "httpretry",
        "config",
        "--total",
        "3",
        "--read",
        "disabled",
        "--redirect",
        "unlimited",
        "--status-forcelist",
        "500,502",
        "--backoff-factor",
        "0.2",
        "--all-methods",
        "--no-raise-on-status",
    ]) {
        CliCommand::Config { policy } => {
            assert_eq!(policy.total, Some(Budget::Remaining(3)));
            assert_eq!(policy.read, Some(Budget::Disabled));
            assert_eq!(policy.redirect, Some(Budget::Unlimited));
            assert_eq!(policy.status_forcelist, Some(vec![500, 502]));

            let cfg = policy.apply(RetryConfig::default());
            assert_eq!(cfg.total, Budget::Remaining(3));
            assert_eq!(cfg.read, Budget::Disabled);
            assert_eq!(cfg.connect, Budget::Unlimited);
            assert_eq!(cfg.backoff_factor, 0.2);
            assert!(!cfg.raise_on_status);
            assert!(cfg.raise_on_redirect);

            let retry = cfg.to_retry().unwrap();
            assert!(retry.is_method_retryable("POST"));
            assert!(retry.is_retry("POST", 502, false));
        }
        _ => panic!("expected Config"),
    }
}

#[test]
fn cli_rejects_bad_budget() {
    use crate::cli::Cli;
    use clap::Parser;
    assert!(Cli::try_parse_from(["httpretry", "config", "--total", "lots"]).is_err());
}

#[test]
fn no_flags_leave_config_untouched() {
    match parse(&["httpretry", "config"]) {
        CliCommand::Config { policy } => {
            let cfg = policy.apply(RetryConfig::default());
            assert_eq!(cfg, RetryConfig::default());
        }
        _ => panic!("expected Config"),
    }
}
