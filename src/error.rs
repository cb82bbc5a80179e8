// src/error.rs
//! Failure taxonomy of the fetch pipeline.
//!
//! `TransportError` is `Clone` because a single failed refresh is handed to
//! every caller that was waiting on it.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Upstream unreachable, connection reset, timed out.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response body from {url}: {reason}")]
    Malformed { url: String, reason: String },

    /// The detached refresh task panicked or was cancelled by the runtime.
    #[error("refresh task aborted: {reason}")]
    Aborted { reason: String },
}

impl TransportError {
    pub fn request(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Request {
            url: url.into(),
            reason: err.to_string(),
        }
    }

    pub fn malformed(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Malformed {
            url: url.into(),
            reason: err.to_string(),
        }
    }

    /// Short machine-friendly label, used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Request { .. } => "request",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
            Self::Aborted { .. } => "aborted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_url_and_status() {
        let e = TransportError::Status {
            url: "http://hn/topstories.json".into(),
            status: 503,
        };
        assert_eq!(e.to_string(), "http://hn/topstories.json answered with HTTP 503");
        assert_eq!(e.kind(), "status");
    }

    #[test]
    fn clones_compare_equal() {
        let e = TransportError::malformed("http://hn/item/1.json", "expected value");
        assert_eq!(e.clone(), e);
    }
}
