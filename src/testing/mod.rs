//! # Checks & Scoreboard
//!
//! A check is one request/expectation pair run against the service under
//! test. The runner records every attempt on a [`Scoreboard`] and hands the
//! caller an immutable [`CheckResult`].

pub mod runner;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::http::method::HttpMethod;

/// Running totals for one session. `passed <= total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    total: usize,
    passed: usize,
}

impl Scoreboard {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    pub(crate) fn record_attempt(&mut self) {
        self.total += 1;
    }

    /// Must follow the matching [`record_attempt`](Self::record_attempt).
    pub(crate) fn record_pass(&mut self) {
        debug_assert!(self.passed < self.total, "pass recorded without an attempt");
        self.passed += 1;
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub method: HttpMethod,
    pub url: String,
    pub expected_status: u16,
    pub observed_status: Option<u16>,
    pub passed: bool,
    pub payload: Option<Value>,
    pub error: Option<String>,
    #[serde(skip)]
    pub raw_body: Option<String>,
    pub duration_ms: Option<u128>,
}

impl CheckResult {
    /// The decoded payload, or an empty mapping when there is none.
    pub fn payload_or_empty(&self) -> Value {
        self.payload
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// `(passed, decoded_or_empty)`; failed checks always yield `{}`.
    pub fn into_outcome(self) -> (bool, Value) {
        if self.passed {
            let payload = self.payload_or_empty();
            (true, payload)
        } else {
            (false, Value::Object(Map::new()))
        }
    }
}
