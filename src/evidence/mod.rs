//! # Evidence Aggregator
//!
//! Static verification that previously applied fixes are still present in
//! source artifacts. Each artifact is read once, every predicate is
//! evaluated independently against the full text, and named groups of
//! predicates are folded with logical AND into per-concern verdicts.
//!
//! Unreadable artifacts never escalate: every predicate becomes
//! indeterminate and every group fails.

pub mod catalog;
pub mod predicate;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::error::{ArtifactError, CatalogError};

use predicate::{Outcome, Predicate};

/// A named AND over a subset of an artifact's predicates.
#[derive(Debug, Clone)]
pub struct PredicateGroup {
    name: String,
    members: Vec<usize>,
    required: bool,
}

/// One catalog entry: where the artifact lives and what to look for.
#[derive(Debug, Clone)]
pub struct ArtifactSpec {
    path: PathBuf,
    predicates: Vec<Predicate>,
    groups: Vec<PredicateGroup>,
}

impl ArtifactSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            predicates: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn predicate(mut self, predicate: Predicate) -> Result<Self, CatalogError> {
        if self.index_of(predicate.label()).is_some() {
            return Err(CatalogError::DuplicatePredicate {
                artifact: self.path.display().to_string(),
                label: predicate.label().to_string(),
            });
        }
        self.predicates.push(predicate);
        Ok(self)
    }

    /// Declare a verdict group over already-declared predicate labels.
    /// Required groups feed the run's exit status.
    pub fn group(mut self, name: &str, labels: &[&str], required: bool) -> Result<Self, CatalogError> {
        let mut members = Vec::with_capacity(labels.len());
        for label in labels {
            let index = self
                .index_of(label)
                .ok_or_else(|| CatalogError::UnknownPredicate {
                    artifact: self.path.display().to_string(),
                    group: name.to_string(),
                    label: (*label).to_string(),
                })?;
            members.push(index);
        }
        self.groups.push(PredicateGroup {
            name: name.to_string(),
            members,
            required,
        });
        Ok(self)
    }

    fn index_of(&self, label: &str) -> Option<usize> {
        self.predicates.iter().position(|p| p.label() == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateResult {
    pub label: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupVerdict {
    pub name: String,
    pub required: bool,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationVerdict {
    pub artifact_path: String,
    pub predicate_results: Vec<PredicateResult>,
    pub groups: Vec<GroupVerdict>,
    pub read_error: Option<String>,
}

impl VerificationVerdict {
    pub fn group(&self, name: &str) -> Option<&GroupVerdict> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// True when the artifact was read and every required group passed.
    pub fn overall(&self) -> bool {
        self.read_error.is_none() && self.groups.iter().filter(|g| g.required).all(|g| g.passed)
    }
}

/// Read `spec`'s artifact under `root` and evaluate it. Re-reads on every
/// call.
pub fn verify(root: &Path, spec: &ArtifactSpec) -> VerificationVerdict {
    let path = root.join(&spec.path);
    match read_artifact(&path) {
        Ok(text) => scan(spec, &text),
        Err(err) => {
            warn!("{err}");
            indeterminate(spec, err.to_string())
        }
    }
}

/// Evaluate every predicate of `spec` against already loaded text.
pub fn scan(spec: &ArtifactSpec, text: &str) -> VerificationVerdict {
    let outcomes: Vec<Outcome> = spec
        .predicates
        .iter()
        .map(|predicate| Outcome::from(predicate.evaluate(text)))
        .collect();
    debug!(
        "{}: {}/{} predicates hold",
        spec.path.display(),
        outcomes.iter().filter(|o| o.is_true()).count(),
        outcomes.len()
    );
    build_verdict(spec, &outcomes, None)
}

fn indeterminate(spec: &ArtifactSpec, error: String) -> VerificationVerdict {
    let outcomes = vec![Outcome::Indeterminate; spec.predicates.len()];
    build_verdict(spec, &outcomes, Some(error))
}

fn build_verdict(spec: &ArtifactSpec, outcomes: &[Outcome], read_error: Option<String>) -> VerificationVerdict {
    let predicate_results = spec
        .predicates
        .iter()
        .zip(outcomes)
        .map(|(predicate, outcome)| PredicateResult {
            label: predicate.label().to_string(),
            outcome: *outcome,
        })
        .collect();

    let groups = spec
        .groups
        .iter()
        .map(|group| GroupVerdict {
            name: group.name.clone(),
            required: group.required,
            passed: group.members.iter().all(|&i| outcomes[i].is_true()),
        })
        .collect();

    VerificationVerdict {
        artifact_path: spec.path.display().to_string(),
        predicate_results,
        groups,
        read_error,
    }
}

fn read_artifact(path: &Path) -> Result<String, ArtifactError> {
    debug!("reading artifact {}", path.display());
    fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })
}
