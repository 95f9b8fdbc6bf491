//! Text output formatting with colors.

use std::collections::BTreeMap;

use dtek_core::{
    BuildingStatus, DaySchedule, OutageKind, Region, ScheduleStatus, ScheduleTable, StatusReport,
};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the region list.
    pub fn format_regions(&self, regions: &[Region]) -> String {
        regions
            .iter()
            .map(|r| format!("{:<6} {}", self.bold(r.code()), r.display_name()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats a plain list under a header.
    pub fn format_list(&self, header: &str, items: &[String]) -> String {
        let mut lines = vec![self.bold(header)];
        if items.is_empty() {
            lines.push(self.dim("  (none)"));
        }
        lines.extend(items.iter().map(|item| format!("  {item}")));
        lines.join("\n")
    }

    /// Formats a weekly schedule table, one block per group.
    pub fn format_table(&self, table: &ScheduleTable) -> String {
        if table.is_empty() {
            return self.dim("No schedules published for these groups");
        }
        table
            .iter()
            .map(|(group, days)| self.format_group(group, days))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn format_group(&self, group: &str, days: &BTreeMap<String, DaySchedule>) -> String {
        let mut lines = vec![self.bold(group)];
        for (day, ranges) in days {
            let name = day
                .parse::<usize>()
                .ok()
                .and_then(|d| DAY_NAMES.get(d.wrapping_sub(1)))
                .copied()
                .unwrap_or(day.as_str());
            lines.push(format!("  {name:<4}{}", self.format_outages(ranges)));
        }
        lines.join("\n")
    }

    /// Formats the ranges of one day, listing only those without power.
    pub fn format_outages(&self, ranges: &DaySchedule) -> String {
        let outages: Vec<String> = ranges
            .iter()
            .filter(|r| r.status != ScheduleStatus::Yes)
            .map(|r| self.color_for_status(r.status, &r.label()))
            .collect();
        if outages.is_empty() {
            self.color_for_status(ScheduleStatus::Yes, "no outages")
        } else {
            outages.join("  ")
        }
    }

    /// Formats a street's status report.
    pub fn format_report(&self, report: &StatusReport) -> String {
        let mut lines = vec![
            format!("{}, {}", self.bold(&report.location), self.bold(&report.street)),
            self.dim(&format!("Updated {}", report.updated_at)),
        ];

        if report.buildings.is_empty() {
            lines.push("  No buildings reported".to_string());
        }
        for (id, building) in &report.buildings {
            lines.push(format!("  {id:<8} {}", self.format_building(building)));
        }

        if !report.schedules.is_empty() {
            lines.push(String::new());
            lines.push(self.format_table(&report.schedules));
        }
        lines.join("\n")
    }

    fn format_building(&self, building: &BuildingStatus) -> String {
        let group = building.group_id.as_deref().unwrap_or("-");
        if !building.has_outage() {
            return format!("{group:<8} {}", self.color_for_status(ScheduleStatus::Yes, "power on"));
        }
        let window = format!(
            "{} until {}",
            building.start_date.as_deref().unwrap_or("?"),
            building.end_date.as_deref().unwrap_or("?"),
        );
        format!(
            "{group:<8} {} {}",
            self.color_for_outage(building.outage),
            window
        )
    }

    // ========================================================================
    // Color Helpers
    // ========================================================================

    fn color_for_status(&self, status: ScheduleStatus, text: &str) -> String {
        let color = match status {
            ScheduleStatus::Yes => GREEN,
            ScheduleStatus::Maybe => YELLOW,
            ScheduleStatus::No => RED,
        };
        self.paint(color, text)
    }

    fn color_for_outage(&self, outage: OutageKind) -> String {
        let color = match outage {
            OutageKind::Planned => YELLOW,
            OutageKind::Stabilization | OutageKind::Emergency => RED,
        };
        self.paint(color, outage.label())
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}
