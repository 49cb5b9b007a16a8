//! Scripted transport: replays a fixed list of attempt outcomes.

use httpretry_core::retry::{AttemptError, AttemptRequest, ResponseInfo};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

pub type Outcome = Result<ResponseInfo, AttemptError>;

pub struct Script {
    outcomes: RefCell<VecDeque<Outcome>>,
    seen: RefCell<Vec<AttemptRequest>>,
    slept: RefCell<Vec<Duration>>,
}

impl Script {
    pub fn new(outcomes: Vec<Outcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            seen: RefCell::new(Vec::new()),
            slept: RefCell::new(Vec::new()),
        }
    }

    /// Next scripted outcome; plain 200 once the script runs out.
    pub fn send(&self, req: &AttemptRequest) -> Outcome {
        self.seen.borrow_mut().push(req.clone());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(ResponseInfo::new(200)))
    }

    pub fn sleep(&self, d: Duration) {
        self.slept.borrow_mut().push(d);
    }

    pub fn requests(&self) -> Vec<AttemptRequest> {
        self.seen.borrow().clone()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept.borrow().clone()
    }
}

pub fn secs(v: &[u64]) -> Vec<Duration> {
    v.iter().map(|s| Duration::from_secs(*s)).collect()
}
