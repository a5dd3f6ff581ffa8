// src/error.rs
// =============================================================================
// Typed errors for the library side of site-mirror.
//
// Only two kinds of failure ever leave a component:
// - FetchError: one URL could not be downloaded. Callers decide what to do
//   (the crawler swallows it, the materializer reports it and moves on).
// - MirrorError: the mirror phase could not even be set up. This is the only
//   error that reaches main() and changes the exit code.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - #[source]: keeps the underlying io::Error so anyhow can print the chain
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Why a single GET failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL could not be handed to the HTTP client
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The server answered, but not with a 2xx status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// No answer before the request timeout elapsed
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection, DNS, TLS or redirect failure
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The response started but its body could not be read
    #[error("could not read body of {url}: {reason}")]
    Body { url: String, reason: String },
}

impl FetchError {
    /// Sorts a reqwest error into one of our variants
    pub fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else if let Some(status) = error.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                reason: error.to_string(),
            }
        }
    }
}

/// Failures that stop the mirror run before any resource is fetched.
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("invalid start url '{url}': {reason}")]
    InvalidStartUrl { url: String, reason: String },

    #[error("could not remove stale output directory {}", path.display())]
    Reset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not create output directory {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
