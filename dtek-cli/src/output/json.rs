//! JSON output formatting.

use anyhow::Result;
use dtek_core::{Region, ScheduleTable, StatusReport};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// One supported region.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionOutput {
    pub code: &'static str,
    pub name: &'static str,
    pub origin: String,
}

/// Locations of a region.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsOutput<'a> {
    pub region: Region,
    pub locations: &'a [String],
}

/// Streets of a location.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreetsOutput<'a> {
    pub region: Region,
    pub location: &'a str,
    pub streets: &'a [String],
}

/// Weekly schedules of the requested groups.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulesOutput<'a> {
    pub region: Region,
    pub schedules: &'a ScheduleTable,
}

/// Status report of a street.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput<'a> {
    pub region: Region,
    #[serde(flatten)]
    pub report: &'a StatusReport,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the region list.
    pub fn format_regions(&self, regions: &[Region]) -> Result<String> {
        let outputs: Vec<RegionOutput> = regions
            .iter()
            .map(|r| RegionOutput {
                code: r.code(),
                name: r.display_name(),
                origin: r.default_origin(),
            })
            .collect();
        self.format(&outputs)
    }
}
