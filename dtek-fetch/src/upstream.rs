//! Upstream client for the regional outage sites.
//!
//! Two calls are made against each region's site:
//! - `GET /ua/shutdowns` returns the directory page and the initial cookies
//! - `POST /ua/ajax` with `method=getHomeNum` returns per-building status
//!
//! The status call replays the region's filtered cookies and the
//! anti-forgery token taken from the directory page.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use dtek_core::{DtekError, Region};
use dtek_parser::status::{StatusResponse, parse_status_response};
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::cookies::CookieJar;
use crate::error::HttpError;
use crate::host::http::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpClient, ResponseExt};

/// Path of the directory page.
pub const DIRECTORY_PATH: &str = "/ua/shutdowns";

/// Path of the status endpoint.
pub const AJAX_PATH: &str = "/ua/ajax";

/// Statuses the status endpoint uses to reject a session.
const AUTH_STATUSES: [u16; 3] = [401, 403, 419];

const CSRF_HEADER: &str = "x-csrf-token";
const REQUESTED_WITH_HEADER: &str = "x-requested-with";

// ============================================================================
// Types
// ============================================================================

/// Raw directory page plus the cookies it set.
#[derive(Debug, Clone)]
pub struct DirectoryPage {
    /// Response body.
    pub body: String,
    /// Cookies from the response.
    pub cookies: CookieJar,
}

/// Parameters of one building-status query.
#[derive(Debug, Clone, Copy)]
pub struct StatusQuery<'a> {
    /// Location name as listed in the directory.
    pub location: &'a str,
    /// Street name as listed in the directory.
    pub street: &'a str,
    /// Freshness stamp of the directory.
    pub updated_at: &'a str,
    /// Anti-forgery token of the directory.
    pub csrf_token: &'a str,
}

impl StatusQuery<'_> {
    /// Builds the form body for `getHomeNum`.
    pub fn form(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("method", "getHomeNum"),
            ("data[0][name]", "city"),
            ("data[0][value]", self.location),
            ("data[1][name]", "street"),
            ("data[1][value]", self.street),
            ("data[2][name]", "updateFact"),
            ("data[2][value]", self.updated_at),
        ]
    }
}

// ============================================================================
// Upstream Trait
// ============================================================================

/// Access to one region's upstream site.
///
/// The session facade is written against this trait so tests can swap in a
/// scripted upstream.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetches the directory page with a fresh cookie jar.
    async fn fetch_directory(&self, region: Region) -> Result<DirectoryPage, DtekError>;

    /// Queries building status, absorbing response cookies into `jar`.
    async fn fetch_building_status(
        &self,
        region: Region,
        query: StatusQuery<'_>,
        jar: &Mutex<CookieJar>,
    ) -> Result<StatusResponse, DtekError>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Settings for [`DtekUpstream`].
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent presented upstream.
    pub user_agent: String,
    /// Origin overrides; regions not listed use their default origin.
    pub origins: BTreeMap<Region, String>,
}

impl UpstreamConfig {
    /// Returns the origin of a region, without a trailing slash.
    pub fn origin(&self, region: Region) -> String {
        self.origins.get(&region).map_or_else(
            || region.default_origin(),
            |o| o.trim_end_matches('/').to_string(),
        )
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            origins: BTreeMap::new(),
        }
    }
}

// ============================================================================
// HTTP Upstream
// ============================================================================

/// [`Upstream`] implementation over HTTP.
#[derive(Debug, Clone)]
pub struct DtekUpstream {
    http: HttpClient,
    config: UpstreamConfig,
}

impl DtekUpstream {
    /// Creates a client restricted to the configured region hosts.
    pub fn new(config: UpstreamConfig) -> Result<Self, DtekError> {
        let mut hosts = Vec::new();
        for region in Region::all() {
            let origin = config.origin(*region);
            let parsed = Url::parse(&origin).map_err(|e| {
                DtekError::validation(format!("upstream.origins.{region}"), e.to_string())
            })?;
            let host = parsed.host_str().ok_or_else(|| {
                DtekError::validation(format!("upstream.origins.{region}"), "has no host")
            })?;
            hosts.push(host.to_string());
        }

        let http = HttpClient::with_options(config.timeout, &config.user_agent)
            .map_err(|e| e.into_dtek("upstream"))?
            .with_allowed_domains(hosts);

        Ok(Self { http, config })
    }

    /// URL of a region's directory page.
    pub fn directory_url(&self, region: Region) -> String {
        format!("{}{DIRECTORY_PATH}", self.config.origin(region))
    }

    /// URL of a region's status endpoint.
    pub fn ajax_url(&self, region: Region) -> String {
        format!("{}{AJAX_PATH}", self.config.origin(region))
    }

    fn page_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("uk-UA,uk;q=0.9,en;q=0.5"),
        );
        headers
    }

    fn ajax_headers(
        &self,
        region: Region,
        csrf_token: &str,
        cookie_header: &str,
    ) -> Result<HeaderMap, DtekError> {
        let mut headers = Self::page_headers();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(
            HeaderName::from_static(REQUESTED_WITH_HEADER),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        let origin = self.config.origin(region);
        if let Ok(value) = HeaderValue::from_str(&origin) {
            headers.insert(header::ORIGIN, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.directory_url(region)) {
            headers.insert(header::REFERER, value);
        }

        let token = HeaderValue::from_str(csrf_token)
            .map_err(|_| DtekError::session("anti-forgery token is not a valid header value"))?;
        headers.insert(HeaderName::from_static(CSRF_HEADER), token);

        if !cookie_header.is_empty() {
            let cookies = HeaderValue::from_str(cookie_header)
                .map_err(|_| DtekError::session("cookie jar is not a valid header value"))?;
            headers.insert(header::COOKIE, cookies);
        }
        Ok(headers)
    }
}

/// Maps a status-endpoint HTTP status to an error, if it is not a success.
pub fn check_status_response(url: &str, status: StatusCode) -> Result<(), DtekError> {
    if status.is_success() {
        return Ok(());
    }
    let code = status.as_u16();
    if AUTH_STATUSES.contains(&code) {
        return Err(DtekError::auth_rejected(format!(
            "status endpoint answered HTTP {code}"
        )));
    }
    Err(DtekError::network(url, Some(code), format!("unexpected status {status}")))
}

#[async_trait]
impl Upstream for DtekUpstream {
    #[instrument(skip(self), fields(region = %region))]
    async fn fetch_directory(&self, region: Region) -> Result<DirectoryPage, DtekError> {
        let url = self.directory_url(region);
        let response = self
            .http
            .get_with_headers(&url, Self::page_headers())
            .await
            .map_err(|e| e.into_dtek(&url))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Directory page request failed");
            return Err(DtekError::network(
                &url,
                Some(status.as_u16()),
                format!("unexpected status {status}"),
            ));
        }

        let mut cookies = CookieJar::new();
        cookies.absorb(response.set_cookie_values());

        let body = response
            .text()
            .await
            .map_err(|e| HttpError::from(e).into_dtek(&url))?;

        debug!(bytes = body.len(), cookies = cookies.len(), "Directory page fetched");
        Ok(DirectoryPage { body, cookies })
    }

    #[instrument(skip(self, query, jar), fields(region = %region, location = %query.location, street = %query.street))]
    async fn fetch_building_status(
        &self,
        region: Region,
        query: StatusQuery<'_>,
        jar: &Mutex<CookieJar>,
    ) -> Result<StatusResponse, DtekError> {
        let url = self.ajax_url(region);
        let cookie_header = jar.lock().await.header_for(region);
        let headers = self.ajax_headers(region, query.csrf_token, &cookie_header)?;

        let response = self
            .http
            .post_form_with_headers(&url, &query.form(), headers)
            .await
            .map_err(|e| e.into_dtek(&url))?;

        let status = response.status();
        let set_cookies = response.set_cookie_values();
        if !set_cookies.is_empty() {
            jar.lock().await.absorb(&set_cookies);
        }

        if let Err(e) = check_status_response(&url, status) {
            warn!(status = %status, "Status query rejected");
            return Err(e);
        }

        let body = response
            .text()
            .await
            .map_err(|e| HttpError::from(e).into_dtek(&url))?;

        let parsed = parse_status_response(&body)?;
        debug!(buildings = parsed.data.len(), result = parsed.result, "Status response parsed");
        Ok(parsed)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream() -> DtekUpstream {
        let mut config = UpstreamConfig::default();
        config
            .origins
            .insert(Region::Oem, "http://127.0.0.1:8080/".to_string());
        DtekUpstream::new(config).unwrap()
    }

    #[test]
    fn test_urls() {
        let up = upstream();
        assert_eq!(
            up.directory_url(Region::Kem),
            "https://www.dtek-kem.com.ua/ua/shutdowns"
        );
        assert_eq!(up.ajax_url(Region::Oem), "http://127.0.0.1:8080/ua/ajax");
    }

    #[test]
    fn test_invalid_origin_rejected() {
        let mut config = UpstreamConfig::default();
        config.origins.insert(Region::Dem, "not a url".to_string());
        let err = DtekUpstream::new(config).unwrap_err();
        assert!(matches!(err, DtekError::Validation { .. }));
    }

    #[test]
    fn test_form_layout() {
        let query = StatusQuery {
            location: "м. Київ",
            street: "вул. Хрещатик",
            updated_at: "19.10.2026 10:35",
            csrf_token: "tok",
        };
        let form = query.form();
        assert_eq!(form[0], ("method", "getHomeNum"));
        assert_eq!(form[2], ("data[0][value]", "м. Київ"));
        assert_eq!(form[4], ("data[1][value]", "вул. Хрещатик"));
        assert_eq!(form[5], ("data[2][name]", "updateFact"));
        assert_eq!(form[6], ("data[2][value]", "19.10.2026 10:35"));
    }

    #[test]
    fn test_ajax_headers() {
        let up = upstream();
        let headers = up
            .ajax_headers(Region::Kem, "tok123", "dtek-kem=s1")
            .unwrap();
        assert_eq!(headers.get("x-csrf-token").unwrap(), "tok123");
        assert_eq!(headers.get(header::COOKIE).unwrap(), "dtek-kem=s1");
        assert_eq!(headers.get("x-requested-with").unwrap(), "XMLHttpRequest");
        assert_eq!(
            headers.get(header::REFERER).unwrap(),
            "https://www.dtek-kem.com.ua/ua/shutdowns"
        );

        let headers = up.ajax_headers(Region::Kem, "tok123", "").unwrap();
        assert!(headers.get(header::COOKIE).is_none());

        assert!(up.ajax_headers(Region::Kem, "bad\ntoken", "").is_err());
    }

    #[test]
    fn test_status_mapping() {
        let url = "https://www.dtek-kem.com.ua/ua/ajax";
        assert!(check_status_response(url, StatusCode::OK).is_ok());
        for code in [401, 403, 419] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = check_status_response(url, status).unwrap_err();
            assert!(err.is_auth_failure(), "HTTP {code} should reject the session");
            assert_eq!(err.status_code(), 401);
        }
        let err = check_status_response(url, StatusCode::BAD_GATEWAY).unwrap_err();
        assert!(matches!(
            err,
            DtekError::Network {
                http_status: Some(502),
                ..
            }
        ));
    }
}
