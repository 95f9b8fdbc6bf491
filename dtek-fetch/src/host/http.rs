//! HTTP client with tracing and domain allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Domain allowlist so only configured upstream hosts are contacted
//! - Per-request header maps for cookies and anti-forgery tokens

use std::time::Duration;

use reqwest::{Client, Response, header, header::HeaderMap};
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent presented to the upstream.
pub const DEFAULT_USER_AGENT: &str = concat!("Mozilla/5.0 (compatible; dtek/", env!("CARGO_PKG_VERSION"), ")");

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a client with the default timeout and user agent.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_options(Duration::from_secs(DEFAULT_TIMEOUT_SECS), DEFAULT_USER_AGENT)
    }

    /// Creates a client with a custom timeout and user agent.
    ///
    /// Cookies are not stored by the client; callers carry their own jar.
    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;

        Ok(Self {
            inner: client,
            allowed_domains: None,
        })
    }

    /// Restricts requests to the given domains and their subdomains.
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Fails unless the URL host is on the allowlist (when one is set).
    fn ensure_allowed(&self, url: &str) -> Result<(), HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("URL has no host".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request with custom headers.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        self.ensure_allowed(url)?;
        debug!("Sending GET");

        let response = self.inner.get(url).headers(headers).send().await?;
        debug!(status = response.status().as_u16(), "Upstream responded");
        Ok(response)
    }

    /// Performs a POST request with form data and custom headers.
    #[instrument(skip(self, form, headers), fields(url = %url))]
    pub async fn post_form_with_headers<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        form: &T,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        self.ensure_allowed(url)?;
        debug!("Sending form POST");

        let response = self
            .inner
            .post(url)
            .headers(headers)
            .form(form)
            .send()
            .await?;
        debug!(status = response.status().as_u16(), "Upstream responded");
        Ok(response)
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Returns every `Set-Cookie` header value that is valid text.
    fn set_cookie_values(&self) -> Vec<String>;
}

impl ResponseExt for Response {
    fn set_cookie_values(&self) -> Vec<String> {
        self.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_allowlist() {
        let client = HttpClient::new()
            .unwrap()
            .with_allowed_domains(vec!["dtek-kem.com.ua".to_string()]);

        assert!(client.ensure_allowed("https://dtek-kem.com.ua/ua/shutdowns").is_ok());

        // Subdomain matching
        assert!(client.ensure_allowed("https://www.dtek-kem.com.ua/ua/ajax").is_ok());

        // Sibling region is a different host
        assert!(client.ensure_allowed("https://www.dtek-krem.com.ua/ua/ajax").is_err());
        assert!(client.ensure_allowed("https://dtek-kem.com.ua.evil.test/").is_err());
    }

    #[test]
    fn test_unrestricted_client() {
        let client = HttpClient::new().unwrap();
        assert!(client.ensure_allowed("https://dtek-oem.com.ua/ua/shutdowns").is_ok());
    }

    #[test]
    fn test_relative_url_rejected() {
        let client = HttpClient::new().unwrap();
        assert!(matches!(
            client.ensure_allowed("/ua/ajax"),
            Err(HttpError::InvalidUrl(_))
        ));
    }
}
