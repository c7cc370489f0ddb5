//! Engine error types.

use std::path::PathBuf;

use orgsync_client::ClientError;
use orgsync_db::error::DatabaseError;

/// Errors from reconciliation, pull, and cascade runs.
///
/// Phase failures inside a sync are recorded in the report rather than
/// returned; these surface only when a run cannot produce a report.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Error from the remote management API.
    #[error("remote error: {0}")]
    Client(#[from] ClientError),

    /// A remote call inside a sync phase failed.
    #[error("{context}: {source}")]
    Step {
        context: String,
        #[source]
        source: ClientError,
    },

    /// Error from the local hierarchy store.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// A referenced local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report could not be serialized.
    #[error("render error: {0}")]
    Render(String),
}

impl EngineError {
    pub(crate) fn step(context: impl Into<String>, source: ClientError) -> Self {
        Self::Step {
            context: context.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Render(err.to_string())
    }
}
