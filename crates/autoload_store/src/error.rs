use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutoloadError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot at {path} has empty required field '{field}'")]
    EmptyField { path: PathBuf, field: &'static str },

    #[error("failed to serialize snapshot for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no home directory available to locate the snapshot file")]
    NoHomeDirectory,
}

impl AutoloadError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
