//! Serde tests for the wire shapes of core types.
//!
//! These shapes are what the CLI prints and what the snapshot store keeps
//! on disk, so field names and enum spellings are pinned here.

use std::collections::BTreeMap;

use serde_json::json;

use crate::{
    BuildingStatus, DailySchedules, DirectorySnapshot, OutageKind, Region, ScheduleRange,
    ScheduleStatus, ScheduleTable, StatusReport, parse_upstream_date,
};

// ============================================================================
// Enum Spellings
// ============================================================================

#[test]
fn test_region_serializes_as_code() {
    for region in Region::all() {
        let value = serde_json::to_value(region).unwrap();
        assert_eq!(value, json!(region.code()));
    }
    assert!(serde_json::from_str::<Region>(r#""lviv""#).is_err());
}

#[test]
fn test_schedule_status_lowercase() {
    let cases = [
        (ScheduleStatus::Yes, "yes"),
        (ScheduleStatus::Maybe, "maybe"),
        (ScheduleStatus::No, "no"),
    ];
    for (status, label) in cases {
        assert_eq!(serde_json::to_value(status).unwrap(), json!(label));
    }
}

#[test]
fn test_outage_kind_snake_case() {
    assert_eq!(
        serde_json::to_value(OutageKind::Stabilization).unwrap(),
        json!("stabilization")
    );
    let kind: OutageKind = serde_json::from_str(r#""emergency""#).unwrap();
    assert_eq!(kind, OutageKind::Emergency);
}

// ============================================================================
// Schedule Range
// ============================================================================

#[test]
fn test_range_shape() {
    let range = ScheduleRange::new(9.5, 12.0, ScheduleStatus::No);
    assert_eq!(
        serde_json::to_value(range).unwrap(),
        json!({ "from": 9.5, "to": 12.0, "status": "no" })
    );
}

// ============================================================================
// Directory Snapshot
// ============================================================================

#[test]
fn test_snapshot_optional_tables_default() {
    // Older store files carry neither table.
    let raw = json!({
        "csrf_token": "tok",
        "updated_at": "19.10.2026 10:35",
        "locations": ["м. Київ"],
        "streets": { "м. Київ": ["вул. Хрещатик"] }
    });
    let snap: DirectorySnapshot = serde_json::from_value(raw).unwrap();
    assert!(snap.schedules.is_none());
    assert!(snap.daily.is_none());
    assert!(snap.validate().is_ok());
}

#[test]
fn test_snapshot_with_tables_roundtrip() {
    let mut days = BTreeMap::new();
    days.insert(
        "3".to_string(),
        vec![
            ScheduleRange::new(0.0, 4.0, ScheduleStatus::Yes),
            ScheduleRange::new(4.0, 7.5, ScheduleStatus::No),
            ScheduleRange::new(7.5, 24.0, ScheduleStatus::Yes),
        ],
    );
    let mut table = ScheduleTable::new();
    table.insert("GPV1.1".to_string(), days.clone());

    let mut daily = DailySchedules {
        today: Some(1_760_824_800),
        days: BTreeMap::new(),
    };
    let mut groups = BTreeMap::new();
    groups.insert("GPV1.1".to_string(), days["3"].clone());
    daily.days.insert(1_760_824_800, groups);

    let mut streets = BTreeMap::new();
    streets.insert("м. Київ".to_string(), vec!["вул. Хрещатик".to_string()]);
    let snap = DirectorySnapshot {
        csrf_token: "tok".to_string(),
        updated_at: "19.10.2026 10:35".to_string(),
        locations: vec!["м. Київ".to_string()],
        streets,
        schedules: Some(table),
        daily: Some(daily),
    };

    let text = serde_json::to_string(&snap).unwrap();
    let back: DirectorySnapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(back, snap);
    assert_eq!(
        back.daily.as_ref().and_then(|d| d.today_for("GPV1.1")).map(Vec::len),
        Some(3)
    );
}

// ============================================================================
// Status Report
// ============================================================================

#[test]
fn test_report_dates_serialize_naive() {
    let building = BuildingStatus {
        outage: OutageKind::Emergency,
        group_id: Some("GPV3.2".to_string()),
        sub_type: Some("Екстрені відключення".to_string()),
        kind: Some("2".to_string()),
        start_date: Some("08:15 19.10.2026".to_string()),
        end_date: Some("12:00 19.10.2026".to_string()),
        starts_at: parse_upstream_date("08:15 19.10.2026"),
        ends_at: parse_upstream_date("12:00 19.10.2026"),
        reasons: vec!["GPV3.2".to_string()],
    };
    let mut buildings = BTreeMap::new();
    buildings.insert("12А".to_string(), building);

    let report = StatusReport {
        location: "м. Київ".to_string(),
        street: "вул. Хрещатик".to_string(),
        updated_at: "19.10.2026 10:35".to_string(),
        buildings,
        schedules: ScheduleTable::new(),
    };

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["buildings"]["12А"]["starts_at"], json!("2026-10-19T08:15:00"));
    assert_eq!(value["buildings"]["12А"]["outage"], json!("emergency"));
}
