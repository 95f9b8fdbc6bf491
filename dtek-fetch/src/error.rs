//! Transport error types.
//!
//! [`HttpError`] stays inside this crate; everything public returns
//! [`DtekError`], so the conversion below is the only place a `reqwest`
//! failure is turned into the shared union.

use dtek_core::DtekError;
use thiserror::Error;

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The client could not be constructed.
    #[error("Client build failed: {0}")]
    Build(String),
}

impl HttpError {
    /// Converts into the shared error union, attributing it to `url`.
    pub fn into_dtek(self, url: &str) -> DtekError {
        match self {
            Self::Request(e) => {
                let status = e.status().map(|s| s.as_u16());
                let message = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    format!("connection failed: {e}")
                } else {
                    e.to_string()
                };
                DtekError::network(url, status, message)
            }
            Self::DomainNotAllowed(host) => {
                DtekError::validation("url", format!("host {host} is not an allowed upstream"))
            }
            Self::InvalidUrl(reason) => DtekError::validation("url", reason),
            Self::Build(reason) => DtekError::network(url, None, reason),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_is_validation() {
        let err = HttpError::DomainNotAllowed("evil.test".to_string()).into_dtek("https://evil.test/");
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("evil.test"));
    }

    #[test]
    fn test_build_error_is_network() {
        let err = HttpError::Build("no tls".to_string()).into_dtek("https://x.test/");
        assert!(matches!(err, DtekError::Network { http_status: None, .. }));
    }
}
