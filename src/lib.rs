//! editor-probe
//!
//! Conformance harness for the video editor backend. Runs a fixed script of
//! HTTP checks against the service, tallies them on a scoreboard, and
//! corroborates that known frontend fixes are still present in the source.

pub mod config;
pub mod error;
pub mod evidence;
pub mod http;
pub mod orchestrator;
pub mod report;
pub mod testing;

pub use config::HarnessConfig;
pub use orchestrator::{Orchestrator, RunSummary};
