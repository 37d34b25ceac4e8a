//! # Orchestrator
//!
//! Runs the fixed script: liveness, status-record checks, media checks, then
//! the evidence scan. Stages advance strictly in order:
//!
//! `Init -> RootChecked -> {Aborted | CoreChecksRun} -> EvidenceScanned -> Done`
//!
//! A failed liveness check aborts the run. A failed create aborts it too
//! unless [`CreateFailurePolicy::Continue`] is configured. Everything after
//! that is reported and the script keeps going.

pub mod fixture;

use std::thread;

use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;
use serde_json::{Value, json};

use crate::config::{CreateFailurePolicy, HarnessConfig};
use crate::evidence::{self, ArtifactSpec, VerificationVerdict};
use crate::http::client::Transport;
use crate::http::method::HttpMethod;
use crate::http::request::CheckRequest;
use crate::report::Reporter;
use crate::testing::runner::CheckRunner;
use crate::testing::{CheckResult, Scoreboard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    RootChecked,
    Aborted,
    CoreChecksRun,
    EvidenceScanned,
    Done,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub stage: Stage,
    pub scoreboard: Scoreboard,
    pub checks: Vec<CheckResult>,
    /// `None` when the record list could not be fetched.
    pub listing_verified: Option<bool>,
    pub verdicts: Vec<VerificationVerdict>,
    pub require_evidence: bool,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.stage == Stage::Done
            && self.scoreboard.all_passed()
            && self.listing_verified != Some(false)
            && (!self.require_evidence || self.verdicts.iter().all(VerificationVerdict::overall))
    }

    pub fn exit_code(&self) -> u8 {
        if self.succeeded() { 0 } else { 1 }
    }
}

pub struct Orchestrator<T> {
    runner: CheckRunner<T>,
    config: HarnessConfig,
    catalog: Vec<ArtifactSpec>,
    reporter: Reporter,
    client_name: String,
    stage: Stage,
    checks: Vec<CheckResult>,
    listing_verified: Option<bool>,
}

impl<T: Transport> Orchestrator<T> {
    pub fn new(transport: T, config: HarnessConfig, catalog: Vec<ArtifactSpec>) -> Self {
        let reporter = Reporter::new(config.output);
        Self {
            runner: CheckRunner::new(transport, config.base_url.clone(), reporter),
            config,
            catalog,
            reporter,
            client_name: generate_client_name(),
            stage: Stage::Init,
            checks: Vec::new(),
            listing_verified: None,
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn run(mut self) -> RunSummary {
        info!(
            "starting run against {} as {}",
            self.config.base_url, self.client_name
        );

        if !self.check_root() {
            self.reporter.fail("Root endpoint test failed, stopping tests");
            return self.finish(Stage::Aborted, Vec::new());
        }
        self.advance(Stage::RootChecked);

        if !self.run_core_checks() {
            return self.finish(Stage::Aborted, Vec::new());
        }
        self.advance(Stage::CoreChecksRun);

        let verdicts = self.scan_evidence();
        self.advance(Stage::EvidenceScanned);

        self.finish(Stage::Done, verdicts)
    }

    fn check_root(&mut self) -> bool {
        self.check(CheckRequest::new("Root API Endpoint", HttpMethod::Get, "api", 200))
            .passed
    }

    /// Returns `false` only when the create-failure policy aborts the run.
    fn run_core_checks(&mut self) -> bool {
        let create = CheckRequest::new("Create Status Check", HttpMethod::Post, "api/status", 200)
            .with_body(json!({ "client_name": self.client_name }));
        if self.check(create).passed {
            if !self.config.settle.is_zero() {
                debug!("waiting {:?} for the record to settle", self.config.settle);
                thread::sleep(self.config.settle);
            }
        } else {
            match self.config.on_create_failure {
                CreateFailurePolicy::Abort => {
                    self.reporter
                        .fail("Create status check test failed, stopping tests");
                    return false;
                }
                CreateFailurePolicy::Continue => {
                    self.reporter.fail("Create status check test failed");
                }
            }
        }

        let list = CheckRequest::new("Get Status Checks", HttpMethod::Get, "api/status", 200);
        let (listed, records) = self.check(list).into_outcome();
        if listed {
            let found = contains_client(&records, &self.client_name);
            if found {
                self.reporter.pass(&format!(
                    "Successfully found created status check with client_name: {}",
                    self.client_name
                ));
            } else {
                self.reporter.fail(&format!(
                    "Could not find created status check with client_name: {}",
                    self.client_name
                ));
            }
            self.listing_verified = Some(found);
        } else {
            self.reporter.fail("Get status checks test failed");
        }

        self.run_media_checks();
        true
    }

    fn run_media_checks(&mut self) {
        match fixture::load_upload_fixture(&self.config.upload_fixture) {
            Ok(part) => {
                let upload = CheckRequest::new("Upload Video", HttpMethod::Post, "api/media/upload", 200)
                    .with_file(part);
                if !self.check(upload).passed {
                    self.reporter.fail("Video upload test failed");
                }
            }
            Err(err) => {
                warn!("{err}");
                self.reporter.fail(&format!("Test file not available: {err}"));
            }
        }

        let media = self.check(CheckRequest::new("Get Media Items", HttpMethod::Get, "api/media", 200));
        if !media.passed {
            self.reporter.fail("Get media items test failed");
        }
    }

    fn scan_evidence(&self) -> Vec<VerificationVerdict> {
        self.catalog
            .iter()
            .map(|spec| {
                let verdict = evidence::verify(&self.config.artifact_root, spec);
                self.reporter.verdict(&verdict);
                verdict
            })
            .collect()
    }

    fn check(&mut self, request: CheckRequest) -> CheckResult {
        let result = self.runner.run_check(request);
        self.checks.push(result.clone());
        result
    }

    fn advance(&mut self, stage: Stage) {
        debug!("stage {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
    }

    fn finish(mut self, stage: Stage, verdicts: Vec<VerificationVerdict>) -> RunSummary {
        self.advance(stage);
        RunSummary {
            stage: self.stage,
            scoreboard: self.runner.scoreboard(),
            checks: self.checks,
            listing_verified: self.listing_verified,
            verdicts,
            require_evidence: self.config.require_evidence,
        }
    }
}

/// `test_client_` followed by eight random lowercase hex digits.
pub fn generate_client_name() -> String {
    let suffix: u32 = rand::thread_rng().r#gen();
    format!("test_client_{suffix:08x}")
}

fn contains_client(records: &Value, client_name: &str) -> bool {
    records
        .as_array()
        .is_some_and(|records| {
            records
                .iter()
                .any(|record| record.get("client_name").and_then(Value::as_str) == Some(client_name))
        })
}
