//! CLI command implementations.

pub mod directory;
pub mod regions;
pub mod schedules;
pub mod snapshot;
pub mod status;
