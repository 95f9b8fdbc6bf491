// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # DTEK Core
//!
//! Core types and the shared failure union for the DTEK outage service.
//!
//! Every other crate in the workspace depends on this one:
//!
//! - Domain models (regions, directory snapshots, schedules, building status)
//! - The [`DtekError`] union and its boundary status mapping
//!
//! ## Key Types
//!
//! ### Directory
//! - [`Region`] - One upstream grid operator
//! - [`DirectorySnapshot`] - Token, freshness stamp, locations, streets
//!
//! ### Schedules
//! - [`ScheduleStatus`] - yes / maybe / no
//! - [`ScheduleRange`] - Half-open range of fractional hours
//! - [`ScheduleTable`] - Group → day → ranges
//! - [`DailySchedules`] - Actual per-day schedules
//!
//! ### Status
//! - [`BuildingStatus`] - One building's outage state
//! - [`StatusReport`] - Everything a street query returns

pub mod error;
pub mod models;

// Re-export error types
pub use error::{DtekError, ParseKind};

// Re-export all model types
pub use models::{
    // Directory
    DirectorySnapshot,
    Region,
    // Schedules
    DailySchedules,
    DaySchedule,
    ScheduleRange,
    ScheduleStatus,
    ScheduleTable,
    format_hour,
    // Status
    BuildingStatus,
    OutageKind,
    StatusReport,
    UPSTREAM_DATE_FORMAT,
    parse_upstream_date,
};
