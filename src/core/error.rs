//! # Core Error Module
//!
//! This module defines the central `LogmoError` type used throughout the library.
//! It leverages `thiserror` for error message formatting and `serde` for serialization.
//!
//! None of these errors ever escape a log statement: the dispatch path reports
//! them through `tracing` and carries on.

use serde::Serialize;
use thiserror::Error;

/// Central error type for the `logmo` library.
#[derive(Debug, Error, Serialize)]
pub enum LogmoError {
    /// Error related to configuration loading or merging.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading or writing the persisted preference scope failed.
    #[error("Preferences error in scope `{scope}`: {details}")]
    Preferences {
        /// The preference scope (e.g. `logmo`).
        scope: String,
        /// What went wrong.
        details: String,
    },

    /// File system failure, typically while writing or removing an export file.
    #[error("IO error at {path}: {details}")]
    Io {
        /// The path being touched when the failure happened.
        path: String,
        details: String,
    },

    /// JSON encoding or decoding failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A printer received metadata lacking one of the default keys,
    /// or carrying it with the wrong value kind.
    #[error("Malformed metadata: missing or mistyped `{key}`")]
    MalformedMetadata { key: String },

    /// A printer failed (returned an error or panicked) while handling an event.
    #[error("Printer `{printer}` failed: {details}")]
    Printer { printer: String, details: String },

    /// Error related to internal logic or state.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LogmoError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            details: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LogmoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<figment::Error> for LogmoError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}
