//! Typed error variants for the keycommand-config crate.
//!
//! Storage collaborators return these so that callers can tell an unreadable
//! file from a malformed one. The registry recovers from every one of them
//! locally (missing or broken stores mean "no customizations"), but the typed
//! variants keep the log messages precise.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or saving the customization store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred reading or writing the store file.
    #[error("I/O error on customization store {path:?}: {source}")]
    Io {
        /// Path of the store file (or its temporary sibling).
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The store contained YAML that could not be parsed, or the map could not
    /// be encoded.
    #[error("YAML error in customization store: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// The store contained JSON that could not be parsed, or the map could not
    /// be encoded.
    #[error("JSON error in customization store: {0}")]
    Json(#[from] serde_json::Error),

    /// The background writer thread could not be started.
    #[error("failed to start customization writer: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The background writer has shut down and no longer accepts writes.
    #[error("customization writer has shut down")]
    WriterClosed,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
