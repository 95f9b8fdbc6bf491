//! Per-building outage status.
//!
//! This module contains the payload of a status query:
//! - [`OutageKind`] - Outage classification
//! - [`BuildingStatus`] - One building's current state
//! - [`StatusReport`] - All buildings on a street plus their schedules

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::schedule::ScheduleTable;

/// Format of upstream date strings, e.g. `"14:30 19.10.2026"`.
pub const UPSTREAM_DATE_FORMAT: &str = "%H:%M %d.%m.%Y";

// ============================================================================
// Outage Kind
// ============================================================================

/// Outage classification, ordered from least to most alarming.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum OutageKind {
    /// Announced maintenance work.
    #[default]
    Planned,
    /// Grid stabilization cut following the published schedule.
    Stabilization,
    /// Unscheduled emergency cut.
    Emergency,
}

impl OutageKind {
    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Planned => "Planned",
            Self::Stabilization => "Stabilization",
            Self::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for OutageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Building Status
// ============================================================================

/// Current state of one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingStatus {
    /// Derived classification.
    pub outage: OutageKind,
    /// Schedule group the building belongs to, when reported.
    pub group_id: Option<String>,
    /// Upstream sub-type text.
    pub sub_type: Option<String>,
    /// Upstream type code.
    pub kind: Option<String>,
    /// Outage start as printed upstream.
    pub start_date: Option<String>,
    /// Expected restoration as printed upstream.
    pub end_date: Option<String>,
    /// Parsed outage start.
    pub starts_at: Option<NaiveDateTime>,
    /// Parsed expected restoration.
    pub ends_at: Option<NaiveDateTime>,
    /// Raw reason codes.
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl BuildingStatus {
    /// Returns true if the upstream reports an ongoing outage window.
    pub fn has_outage(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

/// Parses an upstream `"HH:MM DD.MM.YYYY"` date string.
pub fn parse_upstream_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), UPSTREAM_DATE_FORMAT).ok()
}

// ============================================================================
// Status Report
// ============================================================================

/// Result of a status query for one street.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Queried location.
    pub location: String,
    /// Queried street.
    pub street: String,
    /// Freshness stamp of the directory the query was made with.
    pub updated_at: String,
    /// Building id → status.
    pub buildings: BTreeMap<String, BuildingStatus>,
    /// Weekly schedules of every group referenced above.
    pub schedules: ScheduleTable,
}

impl StatusReport {
    /// Returns the distinct group ids referenced by the buildings.
    pub fn group_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .buildings
            .values()
            .filter_map(|b| b.group_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Returns the most alarming classification on the street.
    pub fn worst_outage(&self) -> Option<OutageKind> {
        self.buildings
            .values()
            .filter(|b| b.has_outage())
            .map(|b| b.outage)
            .max()
    }
}

// ============================================================================
// Tests
// ============================================================================
