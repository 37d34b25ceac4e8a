//! Console output. Text mode prints progress as the run goes; JSON mode stays
//! quiet until the end and prints a single document.

use log::warn;

use crate::config::OutputFormat;
use crate::evidence::VerificationVerdict;
use crate::evidence::predicate::Outcome;
use crate::orchestrator::RunSummary;
use crate::testing::CheckResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reporter {
    format: OutputFormat,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn progress(&self) -> bool {
        self.format == OutputFormat::Text
    }

    pub fn check_started(&self, name: &str, url: &str) {
        if self.progress() {
            println!("\nTesting {name}...\nURL: {url}");
        }
    }

    pub fn check_finished(&self, result: &CheckResult) {
        if self.progress() {
            println!("{}", render_check(result));
        }
    }

    pub fn verdict(&self, verdict: &VerificationVerdict) {
        if self.progress() {
            println!("{}", render_verdict(verdict));
        }
    }

    pub fn pass(&self, message: &str) {
        if self.progress() {
            println!("[PASS] {message}");
        }
    }

    pub fn fail(&self, message: &str) {
        if self.progress() {
            println!("[FAIL] {message}");
        }
    }

    pub fn summary(&self, summary: &RunSummary) {
        match self.format {
            OutputFormat::Text => println!("{}", render_summary(summary)),
            OutputFormat::Json => match serde_json::to_string_pretty(summary) {
                Ok(document) => println!("{document}"),
                Err(err) => {
                    warn!("failed to serialize run summary: {err}");
                    println!("{}", render_summary(summary));
                }
            },
        }
    }
}

pub fn render_check(result: &CheckResult) -> String {
    let mut lines = Vec::new();
    match (result.passed, result.observed_status) {
        (true, Some(status)) => {
            lines.push(format!("[PASS] Status: {status}"));
            if let Some(payload) = &result.payload {
                lines.push(format!("Response: {payload}"));
            }
        }
        (false, Some(status)) if status != result.expected_status => {
            lines.push(format!(
                "[FAIL] Expected {}, got {status}",
                result.expected_status
            ));
            if let Some(body) = result.raw_body.as_deref().filter(|b| !b.is_empty()) {
                lines.push(format!("Error: {body}"));
            }
        }
        _ => {
            let error = result.error.as_deref().unwrap_or("unknown error");
            lines.push(format!("[FAIL] Error: {error}"));
        }
    }
    lines.join("\n")
}

pub fn render_verdict(verdict: &VerificationVerdict) -> String {
    let mut lines = vec![format!("\nVerifying {}", verdict.artifact_path)];
    if let Some(error) = &verdict.read_error {
        lines.push(format!("[FAIL] {error}"));
    }
    for result in &verdict.predicate_results {
        let marker = match result.outcome {
            Outcome::Holds => "[PASS]",
            Outcome::Fails => "[FAIL]",
            Outcome::Indeterminate => "[ ?? ]",
        };
        lines.push(format!("  {marker} {}", result.label));
    }
    for group in &verdict.groups {
        let state = if group.passed { "YES" } else { "NO" };
        let optional = if group.required { "" } else { " (optional)" };
        lines.push(format!("  {}{optional}: {state}", group.name));
    }
    lines.join("\n")
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut lines = vec![format!(
        "\nTests passed: {}/{}",
        summary.scoreboard.passed(),
        summary.scoreboard.total()
    )];
    if let Some(found) = summary.listing_verified {
        let state = if found { "YES" } else { "NO" };
        lines.push(format!("created status record listed: {state}"));
    }
    for verdict in &summary.verdicts {
        for group in &verdict.groups {
            let state = if group.passed { "YES" } else { "NO" };
            lines.push(format!("{}: {state}", group.name));
        }
    }
    lines.join("\n")
}
