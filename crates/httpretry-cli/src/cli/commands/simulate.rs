//! `httpretry simulate` – run a retry chain against scripted outcomes.

use anyhow::{bail, Context, Result};
use httpretry_core::config::RetryConfig;
use httpretry_core::retry::{
    run_with_retry, AttemptError, AttemptRequest, ResponseInfo, RetryResponse, Sleeper,
    ThreadSleeper, REDIRECT_STATUSES,
};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

pub(crate) type Outcome = Result<ResponseInfo, AttemptError>;

#[derive(Debug, Serialize)]
struct AttemptEvent {
    number: usize,
    method: String,
    url: String,
    outcome: String,
}

#[derive(Debug, Default, Serialize)]
struct Report {
    attempts: Vec<AttemptEvent>,
    waits_secs: Vec<f64>,
    final_status: Option<u16>,
    error: Option<String>,
    remaining: BTreeMap<String, String>,
}

/// Parse one scripted outcome (see `httpretry simulate --help`).
pub(crate) fn parse_outcome(s: &str) -> Result<Outcome> {
    let parts: Vec<&str> = s.splitn(3, ':').collect();
    let msg = || "scripted".to_string();
    match parts.as_slice() {
        ["error", kind] => {
            let err = match *kind {
                "connect-timeout" => AttemptError::ConnectTimeout(msg()),
                "new-connection" => AttemptError::NewConnection(msg()),
                "read-timeout" => AttemptError::ReadTimeout(msg()),
                "protocol" => AttemptError::Protocol(msg()),
                "proxy" => AttemptError::proxy(msg(), AttemptError::ConnectTimeout(msg())),
                "other" => AttemptError::Other(msg()),
                other => bail!("unknown error kind {:?} in outcome {:?}", other, s),
            };
            Ok(Err(err))
        }
        ["status", code] => Ok(Ok(ResponseInfo::new(parse_code(code, s)?))),
        ["status", code, retry_after] => Ok(Ok(
            ResponseInfo::new(parse_code(code, s)?).with_header("Retry-After", *retry_after),
        )),
        ["redirect", code, location] => {
            let code = parse_code(code, s)?;
            if !REDIRECT_STATUSES.contains(&code) {
                bail!("{} is not a redirect status in outcome {:?}", code, s);
            }
            Ok(Ok(ResponseInfo::new(code).with_header("Location", *location)))
        }
        _ => bail!("cannot parse outcome {:?}", s),
    }
}

fn parse_code(code: &str, outcome: &str) -> Result<u16> {
    code.parse::<u16>()
        .with_context(|| format!("invalid status code in outcome {:?}", outcome))
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Err(e) => format!("error: {}", e),
        Ok(r) => match (r.redirect_location(), r.header("Retry-After")) {
            (Some(loc), _) => format!("HTTP {} -> {}", r.status(), loc),
            (None, Some(ra)) => format!("HTTP {} (Retry-After: {})", r.status(), ra),
            (None, None) => format!("HTTP {}", r.status()),
        },
    }
}

/// Run the scripted chain through the retry loop and print what happened.
pub fn run_simulate(
    cfg: &RetryConfig,
    method: &str,
    url: &str,
    outcomes: &[String],
    json: bool,
    real_sleep: bool,
) -> Result<()> {
    let retry = cfg.to_retry()?;
    let script = outcomes
        .iter()
        .map(|s| parse_outcome(s))
        .collect::<Result<VecDeque<_>>>()?;
    let script = RefCell::new(script);
    let report = RefCell::new(Report::default());

    let send = |req: &AttemptRequest| -> Outcome {
        let outcome = script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(ResponseInfo::new(200)));
        let mut report = report.borrow_mut();
        let event = AttemptEvent {
            number: report.attempts.len() + 1,
            method: req.method.clone(),
            url: req.url.clone(),
            outcome: describe(&outcome),
        };
        if !json {
            println!(
                "attempt {}: {} {} => {}",
                event.number, event.method, event.url, event.outcome
            );
        }
        report.attempts.push(event);
        outcome
    };
    let sleeper = |d: Duration| {
        if !json {
            println!("  wait {:.3}s", d.as_secs_f64());
        }
        report.borrow_mut().waits_secs.push(d.as_secs_f64());
        if real_sleep {
            ThreadSleeper.sleep(d);
        }
    };

    let result = run_with_retry(&retry, AttemptRequest::new(method, url), &sleeper, None, send);

    let mut report = report.into_inner();
    match result {
        Ok((resp, retries)) => {
            report.final_status = Some(resp.status());
            report.remaining = retries
                .budgets()
                .iter()
                .map(|(name, b)| (name.to_string(), b.to_string()))
                .collect();
            if !json {
                println!(
                    "done: HTTP {} after {} attempt(s), {} retried",
                    resp.status(),
                    report.attempts.len(),
                    retries.history().len()
                );
                for (name, budget) in &report.remaining {
                    println!("  {:<9} {}", name, budget);
                }
            }
        }
        Err(e) => {
            tracing::info!("simulation gave up: {}", e);
            if !json {
                println!("gave up: {}", e);
            }
            report.error = Some(e.to_string());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
