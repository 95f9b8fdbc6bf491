// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # DTEK Fetch
//!
//! Network plumbing for the DTEK outage service.
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client with tracing and domain allowlist
//!
//! ## Session Transport
//!
//! - [`cookies::CookieJar`] - Accumulates `Set-Cookie` values and renders a
//!   region-filtered `Cookie` header
//! - [`upstream::Upstream`] - The two upstream calls, with an HTTP
//!   implementation in [`upstream::DtekUpstream`]
//!
//! ## Retry
//!
//! - [`retry::RetryStrategy`] - Stepped-delay retry used at the boundary
//!
//! ## Example
//!
//! ```ignore
//! use dtek_fetch::{DtekUpstream, RetryStrategy, Upstream, UpstreamConfig};
//!
//! let upstream = DtekUpstream::new(UpstreamConfig::default())?;
//! let page = RetryStrategy::default()
//!     .run(|| upstream.fetch_directory(Region::Kem))
//!     .await?;
//! ```

// Core modules
pub mod cookies;
pub mod error;
pub mod host;
pub mod retry;
pub mod upstream;

// Re-export key types at crate root

// Errors
pub use error::HttpError;

// Host APIs
pub use host::http::HttpClient;

// Session transport
pub use cookies::{CookieJar, allowed_prefixes};
pub use upstream::{DirectoryPage, DtekUpstream, StatusQuery, Upstream, UpstreamConfig};

// Retry
pub use retry::{RetryObserver, RetryStrategy};
