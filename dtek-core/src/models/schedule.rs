//! Compressed outage schedules.
//!
//! The upstream publishes schedules as hourly grids. They are stored here
//! as ordered lists of half-open ranges over fractional hours of the day,
//! so `9.5` means 09:30.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Schedule Status
// ============================================================================

/// Normalized power availability for a stretch of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    /// Power is expected to be on.
    Yes,
    /// Power may be cut.
    Maybe,
    /// Power is expected to be off.
    No,
}

impl ScheduleStatus {
    /// Returns the lowercase wire label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::Maybe => "maybe",
            Self::No => "no",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Schedule Range
// ============================================================================

/// A half-open interval `[from, to)` of hours with one status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRange {
    /// Start hour, inclusive.
    pub from: f64,
    /// End hour, exclusive.
    pub to: f64,
    /// Status for the whole range.
    pub status: ScheduleStatus,
}

impl ScheduleRange {
    /// Creates a new range.
    pub fn new(from: f64, to: f64, status: ScheduleStatus) -> Self {
        Self { from, to, status }
    }

    /// Length of the range in hours.
    pub fn hours(&self) -> f64 {
        self.to - self.from
    }

    /// Formats the range as `HH:MM–HH:MM`.
    pub fn label(&self) -> String {
        format!("{}–{}", format_hour(self.from), format_hour(self.to))
    }
}

/// Formats a fractional hour as `HH:MM`.
pub fn format_hour(hour: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let minutes = (hour * 60.0).round() as u32;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

// ============================================================================
// Tables
// ============================================================================

/// Ranges for one day, ascending and merged.
pub type DaySchedule = Vec<ScheduleRange>;

/// Weekly table: group id → day of week `"1"`..`"7"` → ranges.
pub type ScheduleTable = BTreeMap<String, BTreeMap<String, DaySchedule>>;

/// Actual per-day schedules published alongside the freshness stamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySchedules {
    /// Unix timestamp of the start of "today" according to the upstream.
    pub today: Option<i64>,
    /// Day start (unix seconds) → group id → ranges.
    pub days: BTreeMap<i64, BTreeMap<String, DaySchedule>>,
}

impl DailySchedules {
    /// Returns true if no day carries any group.
    pub fn is_empty(&self) -> bool {
        self.days.values().all(BTreeMap::is_empty)
    }

    /// Returns the ranges of one group for today, if published.
    pub fn today_for(&self, group: &str) -> Option<&DaySchedule> {
        let today = self.today?;
        self.days.get(&today)?.get(group)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hour() {
        assert_eq!(format_hour(0.0), "00:00");
        assert_eq!(format_hour(9.5), "09:30");
        assert_eq!(format_hour(24.0), "24:00");
    }

    #[test]
    fn test_range_label_and_width() {
        let range = ScheduleRange::new(17.5, 21.0, ScheduleStatus::No);
        assert_eq!(range.label(), "17:30–21:00");
        assert!((range.hours() - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_daily_today_lookup() {
        let mut groups = BTreeMap::new();
        groups.insert(
            "GPV1.1".to_string(),
            vec![ScheduleRange::new(0.0, 24.0, ScheduleStatus::Yes)],
        );
        let mut daily = DailySchedules {
            today: Some(1_760_824_800),
            days: BTreeMap::new(),
        };
        assert!(daily.is_empty());
        daily.days.insert(1_760_824_800, groups);

        assert!(!daily.is_empty());
        assert_eq!(daily.today_for("GPV1.1").map(Vec::len), Some(1));
        assert!(daily.today_for("GPV2.1").is_none());
    }
}
