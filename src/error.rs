//! Error types for configuration loading and report output.

use std::path::PathBuf;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid severity {0:?}, must be one of critical, high, medium, low")]
    InvalidSeverity(String),

    #[error("invalid glob {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown gate {0:?} in hooks.fast_gates")]
    UnknownFastGate(String),

    #[error("gates.{0}.max_per_file must be at least 1")]
    ZeroCap(&'static str),
}

/// Errors raised while writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("writing report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing report: {0}")]
    Serialize(#[from] serde_json::Error),
}
