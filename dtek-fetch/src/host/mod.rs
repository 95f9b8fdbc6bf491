//! Host APIs for talking to the upstream sites.
//!
//! - [`http`] - HTTP client with tracing and a domain allowlist

pub mod http;

// Re-export key types
pub use http::{HttpClient, ResponseExt};
