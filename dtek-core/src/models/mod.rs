//! Domain models for the DTEK outage service.
//!
//! ## Submodules
//!
//! - [`region`] - Upstream regions
//! - [`directory`] - The parsed directory snapshot
//! - [`schedule`] - Compressed schedule ranges and tables
//! - [`status`] - Per-building outage status

pub mod directory;
pub mod region;
pub mod schedule;
pub mod status;

// Re-export everything at the models level
pub use directory::DirectorySnapshot;
pub use region::Region;
pub use schedule::{
    DailySchedules, DaySchedule, ScheduleRange, ScheduleStatus, ScheduleTable, format_hour,
};
pub use status::{
    BuildingStatus, OutageKind, StatusReport, UPSTREAM_DATE_FORMAT, parse_upstream_date,
};

#[cfg(test)]
mod serde_tests;
