//! The parsed directory of one region.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{DtekError, ParseKind};
use crate::models::schedule::{DailySchedules, ScheduleTable};

// ============================================================================
// Directory Snapshot
// ============================================================================

/// Everything one directory page yields for a region.
///
/// A snapshot is built wholesale by a single parse and never mutated
/// afterwards; a refresh produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    /// Anti-forgery token replayed on authenticated queries.
    pub csrf_token: String,
    /// Freshness stamp exactly as the upstream printed it.
    pub updated_at: String,
    /// All location names, in upstream order.
    pub locations: Vec<String>,
    /// Location → street names.
    pub streets: BTreeMap<String, Vec<String>>,
    /// Weekly schedule table, when the page carried one.
    #[serde(default)]
    pub schedules: Option<ScheduleTable>,
    /// Actual per-day schedules, when the page carried them.
    #[serde(default)]
    pub daily: Option<DailySchedules>,
}

impl DirectorySnapshot {
    /// Checks the structural invariants.
    ///
    /// The location list must be exactly the key set of the street map and
    /// the token must not be empty.
    pub fn validate(&self) -> Result<(), DtekError> {
        if self.csrf_token.trim().is_empty() {
            return Err(DtekError::parse(
                ParseKind::Snapshot,
                "non-empty anti-forgery token",
                Some("empty string".to_string()),
            ));
        }

        if self.locations.len() != self.streets.len() {
            return Err(DtekError::parse(
                ParseKind::Snapshot,
                format!("{} locations to match street map keys", self.streets.len()),
                Some(format!("{} locations", self.locations.len())),
            ));
        }

        let listed: BTreeSet<&str> = self.locations.iter().map(String::as_str).collect();
        if listed.len() != self.locations.len() {
            return Err(DtekError::parse(
                ParseKind::Snapshot,
                "unique location names",
                Some("duplicate location".to_string()),
            ));
        }

        if let Some(missing) = self.streets.keys().find(|k| !listed.contains(k.as_str())) {
            return Err(DtekError::parse(
                ParseKind::Snapshot,
                "every street map key listed as a location",
                Some(format!("unlisted key {missing:?}")),
            ));
        }

        Ok(())
    }

    /// Returns the streets of a location.
    pub fn streets_of(&self, location: &str) -> Option<&[String]> {
        self.streets.get(location).map(Vec::as_slice)
    }

    /// Returns the weekly table restricted to the given groups.
    ///
    /// Unknown groups are ignored; a snapshot without a table yields an
    /// empty one.
    pub fn schedules_for<S: AsRef<str>>(&self, groups: &[S]) -> ScheduleTable {
        let Some(table) = &self.schedules else {
            return ScheduleTable::new();
        };
        groups
            .iter()
            .filter_map(|g| {
                let g = g.as_ref();
                table.get(g).map(|days| (g.to_string(), days.clone()))
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
