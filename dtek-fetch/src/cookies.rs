//! Session cookie jar.
//!
//! The jar accumulates cookies from `Set-Cookie` response headers and
//! renders a region-scoped `Cookie` request header. Only a small allow-list
//! of cookie families is ever replayed upstream.

use std::collections::BTreeMap;

use dtek_core::Region;
use serde::{Deserialize, Serialize};
use tracing::trace;

// ============================================================================
// Allow-list
// ============================================================================

/// Returns the cookie-name prefixes replayed to a region.
///
/// Session and anti-forgery cookies are scoped by region code; the language
/// cookie and the three bot-mitigation families are shared.
pub fn allowed_prefixes(region: Region) -> [String; 6] {
    let code = region.code();
    [
        format!("dtek-{code}"),
        format!("_csrf-dtek-{code}"),
        "_language".to_string(),
        "incap_ses_".to_string(),
        "visid_incap_".to_string(),
        "nlbi_".to_string(),
    ]
}

// ============================================================================
// Cookie Jar
// ============================================================================

/// Name → value cookie store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorbs raw `Set-Cookie` header values.
    ///
    /// Only the leading `name=value` pair of each header is kept; attributes
    /// such as `Path` or `Expires` are discarded. Entries without a name or
    /// without `=` are ignored. A later entry overwrites an earlier one with
    /// the same name.
    pub fn absorb<I, S>(&mut self, headers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for raw in headers {
            let Some((name, value)) = parse_set_cookie(raw.as_ref()) else {
                trace!("Ignoring malformed Set-Cookie header");
                continue;
            };
            self.cookies.insert(name.to_string(), value.to_string());
        }
    }

    /// Inserts a single cookie.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    /// Returns a cookie value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Number of stored cookies.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns true if the jar holds no cookies.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Renders the `Cookie` header for a region, dropping every cookie that
    /// does not match the region's allow-list.
    pub fn header_for(&self, region: Region) -> String {
        let prefixes = allowed_prefixes(region);
        self.cookies
            .iter()
            .filter(|(name, _)| prefixes.iter().any(|p| name.starts_with(p.as_str())))
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Extracts the leading `name=value` pair of a `Set-Cookie` header.
fn parse_set_cookie(raw: &str) -> Option<(&str, &str)> {
    let pair = raw.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, value.trim()))
}

// ============================================================================
// Tests
// ============================================================================
