// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # DTEK Parser
//!
//! Extraction of the DTEK directory page and the status endpoint.
//!
//! The directory page is HTML with the interesting data assigned to globals
//! inside inline scripts. This crate finds those assignments with a full
//! JavaScript parser and turns their right-hand sides into data with a
//! restricted literal evaluator that never runs code.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`html`] | Token lookup, bot interstitial detection, inline scripts |
//! | [`script`] | Locating `Object.property = ...` assignments |
//! | [`literal`] | Depth-bounded literal evaluation |
//! | [`schedule`] | Hourly grid to range compression |
//! | [`directory`] | Assembling a [`DirectorySnapshot`](dtek_core::DirectorySnapshot) |
//! | [`status`] | Status response schema and report transform |
//!
//! ## Usage
//!
//! ```ignore
//! use dtek_parser::parse_directory;
//! use dtek_core::Region;
//!
//! let snapshot = parse_directory(&body, Some(Region::Kem))?;
//! println!("{} locations, updated {}", snapshot.locations.len(), snapshot.updated_at);
//! ```

pub mod directory;
pub mod html;
pub mod literal;
pub mod schedule;
pub mod script;
pub mod status;

mod parser_edge_tests;

// Re-export the entry points
pub use directory::parse_directory;
pub use schedule::{SlotCode, compress_day, daily_from_fact, merge_ranges, table_from_preset};
pub use script::{Assignment, find_assignment};
pub use status::{
    RawBuildingStatus, StatusResponse, build_report, classify_outage, extract_group_id,
    parse_status_response,
};
