// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # DTEK Store
//!
//! Session, cache and configuration layer for the DTEK outage service.
//!
//! This crate provides:
//!
//! - **RegionStore**: Per-region facade with single-flight session refresh
//!   and a status cache
//! - **RegionRegistry**: Lazily created facades keyed by region
//! - **SnapshotStore**: Optional read-through source of precomputed sessions
//! - **Config**: JSON configuration with environment overrides
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use dtek_core::Region;
//! use dtek_fetch::DtekUpstream;
//! use dtek_store::{Config, RegionRegistry};
//!
//! let config = Config::load()?;
//! let upstream = Arc::new(DtekUpstream::new(config.upstream_config())?);
//! let registry = RegionRegistry::new(upstream, config.facade_config());
//!
//! let kyiv = registry.get(Region::Kem).await;
//! for location in kyiv.get_locations().await? {
//!     println!("{location}");
//! }
//! ```

pub mod config;
pub mod error;
pub mod region_store;
pub mod registry;
pub mod snapshot_store;

pub use config::Config;
pub use error::ConfigError;
pub use region_store::{FacadeConfig, RegionStore, Session};
pub use registry::RegionRegistry;
pub use snapshot_store::{JsonDirStore, SnapshotStore, StoredSession};
