// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for accessscan

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for accessscan
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch URL: {message}")]
    UpstreamFetch {
        /// Upstream HTTP status, absent for network failures
        status: Option<u16>,
        message: String,
    },

    #[error("Rule engine error: {0}")]
    EngineExecution(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid import file format: {0}")]
    ImportFormat(String),

    #[error("Export error: {0}")]
    ExportRender(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    /// Source chain rendered one cause per line, for server-side diagnostics
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
