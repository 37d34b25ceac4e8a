//! # Harness Configuration
//!
//! Every setting has a literal default and can be overridden through a
//! `PROBE_*` environment variable. Malformed values are logged and replaced
//! by the default; configuration never stops a run.

use std::path::PathBuf;
use std::time::Duration;

use log::warn;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";
pub const DEFAULT_SETTLE_MS: u64 = 1000;
const DEFAULT_FIXTURE_NAME: &str = "test_video.mp4";

pub const BASE_URL_VAR: &str = "PROBE_BASE_URL";
pub const ARTIFACT_ROOT_VAR: &str = "PROBE_ARTIFACT_ROOT";
pub const UPLOAD_FIXTURE_VAR: &str = "PROBE_UPLOAD_FIXTURE";
pub const ON_CREATE_FAILURE_VAR: &str = "PROBE_ON_CREATE_FAILURE";
pub const SETTLE_MS_VAR: &str = "PROBE_SETTLE_MS";
pub const REQUIRE_EVIDENCE_VAR: &str = "PROBE_REQUIRE_EVIDENCE";
pub const OUTPUT_VAR: &str = "PROBE_OUTPUT";

/// What to do when creating a status record fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateFailurePolicy {
    /// Stop the run; later checks would operate on a record that never existed.
    #[default]
    Abort,
    /// Record the failure and keep going.
    Continue,
}

/// Format of the console report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub base_url: String,
    pub artifact_root: PathBuf,
    pub upload_fixture: PathBuf,
    pub on_create_failure: CreateFailurePolicy,
    pub settle: Duration,
    pub require_evidence: bool,
    pub output: OutputFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            artifact_root: PathBuf::from("."),
            upload_fixture: std::env::temp_dir().join(DEFAULT_FIXTURE_NAME),
            on_create_failure: CreateFailurePolicy::default(),
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            require_evidence: true,
            output: OutputFormat::default(),
        }
    }
}

impl HarnessConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the configuration through `lookup`, with variables overriding
    /// the defaults. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = get(BASE_URL_VAR) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(root) = get(ARTIFACT_ROOT_VAR) {
            config.artifact_root = PathBuf::from(root);
        }
        if let Some(fixture) = get(UPLOAD_FIXTURE_VAR) {
            config.upload_fixture = PathBuf::from(fixture);
        }
        if let Some(raw) = get(ON_CREATE_FAILURE_VAR) {
            match raw.to_ascii_lowercase().as_str() {
                "abort" => config.on_create_failure = CreateFailurePolicy::Abort,
                "continue" => config.on_create_failure = CreateFailurePolicy::Continue,
                _ => fallback(ON_CREATE_FAILURE_VAR, &raw, "abort"),
            }
        }
        if let Some(raw) = get(SETTLE_MS_VAR) {
            match raw.parse::<u64>() {
                Ok(ms) => config.settle = Duration::from_millis(ms),
                Err(_) => fallback(SETTLE_MS_VAR, &raw, &DEFAULT_SETTLE_MS.to_string()),
            }
        }
        if let Some(raw) = get(REQUIRE_EVIDENCE_VAR) {
            match parse_flag(&raw) {
                Some(flag) => config.require_evidence = flag,
                None => fallback(REQUIRE_EVIDENCE_VAR, &raw, "true"),
            }
        }
        if let Some(raw) = get(OUTPUT_VAR) {
            match raw.to_ascii_lowercase().as_str() {
                "text" => config.output = OutputFormat::Text,
                "json" => config.output = OutputFormat::Json,
                _ => fallback(OUTPUT_VAR, &raw, "text"),
            }
        }

        config
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn fallback(key: &str, raw: &str, default: &str) {
    warn!("ignoring invalid {key}=`{raw}`, using `{default}`");
}
