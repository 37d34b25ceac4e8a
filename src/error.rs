use std::path::PathBuf;

use thiserror::Error;

/// Failure to complete one HTTP exchange. The check runner converts every
/// variant into a failed check; none of them reach `main`.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid request for `{url}`: {reason}")]
    InvalidRequest { url: String, reason: String },
    #[error("request to `{url}` failed: {source}")]
    Send {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read response from `{url}`: {source}")]
    ReadBody {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A source artifact could not be read.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The upload fixture could not be created or loaded.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to create upload fixture `{}`: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read upload fixture `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The evidence catalog is malformed. This is the only startup error that
/// stops the harness.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("predicate `{label}` has an invalid pattern: {source}")]
    Pattern {
        label: String,
        #[source]
        source: regex::Error,
    },
    #[error("group `{group}` in `{artifact}` names unknown predicate `{label}`")]
    UnknownPredicate {
        artifact: String,
        group: String,
        label: String,
    },
    #[error("artifact `{artifact}` declares predicate `{label}` twice")]
    DuplicatePredicate { artifact: String, label: String },
}
