//! The failure union shared by every DTEK component.
//!
//! Every fallible operation in the workspace returns `Result<T, DtekError>`.
//! Lower-level errors (HTTP, JSON, I/O) are converted into one of these
//! cases at the lowest layer that sees them, so each case carries enough
//! structured context to be logged and mapped to a boundary status code.

use std::fmt;

use thiserror::Error;

use crate::models::Region;

// ============================================================================
// Parse Kind
// ============================================================================

/// Which stage of extraction produced a [`DtekError::Parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseKind {
    /// HTML document structure (tags, attributes).
    Html,
    /// Inline script source text.
    Script,
    /// Literal evaluation of an assignment's right-hand side.
    Literal,
    /// JSON syntax of an upstream response body.
    Json,
    /// Shape of decoded data (missing or mistyped fields).
    Schema,
    /// Structural invariants of an assembled snapshot.
    Snapshot,
}

impl ParseKind {
    /// Returns a short lowercase label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Script => "script",
            Self::Literal => "literal",
            Self::Json => "json",
            Self::Schema => "schema",
            Self::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for ParseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// DTEK Error
// ============================================================================

/// Error type for every DTEK operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DtekError {
    /// Transport failure or a non-success HTTP status.
    #[error("Network error for {url}{}: {message}", fmt_status(.http_status))]
    Network {
        /// Requested URL.
        url: String,
        /// HTTP status, when a response was received.
        http_status: Option<u16>,
        /// Human-readable cause.
        message: String,
    },

    /// Upstream content did not have the expected shape.
    #[error("Parse error ({kind}): expected {expected}{}", fmt_found(.found))]
    Parse {
        /// Extraction stage.
        kind: ParseKind,
        /// What was expected.
        expected: String,
        /// What was found instead, if known.
        found: Option<String>,
    },

    /// Session material is missing, expired, or was rejected upstream.
    #[error("Session error: {reason}")]
    Session {
        /// Why the session is unusable.
        reason: String,
        /// True when the upstream rejected our credentials.
        auth_rejected: bool,
    },

    /// Caller input violates a constraint.
    #[error("Validation error: {field} {constraint}")]
    Validation {
        /// Offending field.
        field: String,
        /// Constraint that was violated.
        constraint: String,
    },

    /// Upstream served a bot-protection interstitial instead of data.
    #[error("Region unavailable{}", fmt_region(.region))]
    RegionUnavailable {
        /// The blocked region, when known.
        region: Option<Region>,
    },

    /// All retry attempts failed.
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The failure from the final attempt.
        last_error: Box<DtekError>,
    },

    /// The read-through snapshot store could not provide a value.
    #[error("Store error for {key}: {reason}")]
    Store {
        /// Store key that was requested.
        key: String,
        /// Why the lookup failed.
        reason: String,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

fn fmt_found(found: &Option<String>) -> String {
    found
        .as_deref()
        .map(|f| format!(", found {f}"))
        .unwrap_or_default()
}

fn fmt_region(region: &Option<Region>) -> String {
    region.map(|r| format!(": {}", r.code())).unwrap_or_default()
}

impl DtekError {
    /// Creates a network error.
    pub fn network(url: impl Into<String>, http_status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            http_status,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(kind: ParseKind, expected: impl Into<String>, found: Option<String>) -> Self {
        Self::Parse {
            kind,
            expected: expected.into(),
            found,
        }
    }

    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
        }
    }

    /// Creates a session error that is not an authentication rejection.
    pub fn session(reason: impl Into<String>) -> Self {
        Self::Session {
            reason: reason.into(),
            auth_rejected: false,
        }
    }

    /// Creates a session error for credentials the upstream rejected.
    pub fn auth_rejected(reason: impl Into<String>) -> Self {
        Self::Session {
            reason: reason.into(),
            auth_rejected: true,
        }
    }

    /// Creates a store error.
    pub fn store(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns the status code the routing layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Network { .. } | Self::RegionUnavailable { .. } | Self::Store { .. } => 503,
            Self::Parse { .. } => 502,
            Self::Session { auth_rejected, .. } => {
                if *auth_rejected {
                    401
                } else {
                    503
                }
            }
            Self::Validation { .. } => 400,
            Self::RetryExhausted { last_error, .. } => last_error.status_code(),
        }
    }

    /// Returns true when the upstream rejected our session credentials.
    ///
    /// Looks through [`DtekError::RetryExhausted`] to the final failure.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Session { auth_rejected, .. } => *auth_rejected,
            Self::RetryExhausted { last_error, .. } => last_error.is_auth_failure(),
            _ => false,
        }
    }

    /// Returns true if this is a failure that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { http_status, .. } => {
                http_status.is_none_or(|s| s >= 500 || s == 408 || s == 429)
            }
            Self::Session { .. } | Self::Store { .. } => true,
            Self::RetryExhausted { last_error, .. } => last_error.is_transient(),
            Self::Parse { .. } | Self::Validation { .. } | Self::RegionUnavailable { .. } => false,
        }
    }

    /// Returns the innermost error, unwrapping retry exhaustion.
    pub fn root(&self) -> &DtekError {
        match self {
            Self::RetryExhausted { last_error, .. } => last_error.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for DtekError {
    fn from(e: serde_json::Error) -> Self {
        let kind = if e.is_syntax() || e.is_eof() {
            ParseKind::Json
        } else {
            ParseKind::Schema
        };
        DtekError::parse(kind, "well-formed upstream data", Some(e.to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(DtekError::network("u", None, "down").status_code(), 503);
        assert_eq!(
            DtekError::parse(ParseKind::Html, "token", None).status_code(),
            502
        );
        assert_eq!(DtekError::session("expired").status_code(), 503);
        assert_eq!(DtekError::auth_rejected("403").status_code(), 401);
        assert_eq!(DtekError::validation("street", "is empty").status_code(), 400);
        assert_eq!(
            DtekError::RegionUnavailable { region: None }.status_code(),
            503
        );
        assert_eq!(DtekError::store("kem", "missing").status_code(), 503);
    }

    #[test]
    fn test_retry_exhausted_unwraps_inner_code() {
        let err = DtekError::RetryExhausted {
            attempts: 3,
            last_error: Box::new(DtekError::validation("location", "unknown")),
        };
        assert_eq!(err.status_code(), 400);
        assert!(matches!(err.root(), DtekError::Validation { .. }));
    }

    #[test]
    fn test_auth_failure_detection() {
        assert!(DtekError::auth_rejected("HTTP 419").is_auth_failure());
        assert!(!DtekError::session("no session").is_auth_failure());
        assert!(!DtekError::network("u", Some(401), "x").is_auth_failure());

        let wrapped = DtekError::RetryExhausted {
            attempts: 2,
            last_error: Box::new(DtekError::auth_rejected("HTTP 401")),
        };
        assert!(wrapped.is_auth_failure());
    }

    #[test]
    fn test_transient_classification() {
        assert!(DtekError::network("u", None, "reset").is_transient());
        assert!(DtekError::network("u", Some(502), "bad gateway").is_transient());
        assert!(!DtekError::network("u", Some(404), "not found").is_transient());
        assert!(!DtekError::validation("x", "y").is_transient());
    }

    #[test]
    fn test_display_includes_context() {
        let err = DtekError::network("https://example.test/", Some(503), "unavailable");
        assert_eq!(
            err.to_string(),
            "Network error for https://example.test/ (HTTP 503): unavailable"
        );

        let err = DtekError::parse(ParseKind::Literal, "literal", Some("CallExpression".into()));
        assert_eq!(
            err.to_string(),
            "Parse error (literal): expected literal, found CallExpression"
        );

        let err = DtekError::RegionUnavailable {
            region: Some(Region::Kem),
        };
        assert_eq!(err.to_string(), "Region unavailable: kem");
    }

    #[test]
    fn test_json_error_conversion() {
        let err: DtekError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(
            err,
            DtekError::Parse {
                kind: ParseKind::Json,
                ..
            }
        ));

        let err: DtekError = serde_json::from_str::<Vec<u8>>("{}").unwrap_err().into();
        assert!(matches!(
            err,
            DtekError::Parse {
                kind: ParseKind::Schema,
                ..
            }
        ));
    }
}
