//! Error taxonomy.
//!
//! Nothing here is fatal to the running server: parse failures degrade to an
//! empty result, static file errors become error pages, and dead event
//! connections are pruned on the next broadcast. Only CLI validation at
//! startup exits the process.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to run the external parser process.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn parser: {0}")]
    Spawn(std::io::Error),
    #[error("failed reading parser output: {0}")]
    Io(std::io::Error),
    #[error("parser timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Source(#[from] FileAccessError),
}

/// Failure to read a static asset or watched path.
#[derive(Debug, Error)]
#[error("cannot access {path}: {source}")]
pub struct FileAccessError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl FileAccessError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}
