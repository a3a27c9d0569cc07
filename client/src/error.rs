use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the Listing Service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport failure: connection refused, timeout, TLS.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("listing service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The body was not the JSON we expected.
    #[error("unexpected response body from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ServiceError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            ServiceError::Http(err) => err.status(),
            ServiceError::Decode { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid timeout {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),
}

/// Errors from the local JSON store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
