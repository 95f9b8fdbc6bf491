//! Status endpoint response schema and transform.
//!
//! The body is decoded in two steps so syntax and shape failures can be told
//! apart: first into a [`serde_json::Value`] ([`ParseKind::Json`]), then into
//! [`StatusResponse`] ([`ParseKind::Schema`]).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use dtek_core::{
    BuildingStatus, DirectorySnapshot, DtekError, OutageKind, ParseKind, StatusReport,
    parse_upstream_date,
};

/// Schedule group ids look like `GPV1.2` or `GPV7`.
static GROUP_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"GPV\d+(?:\.\d+)?").expect("Invalid regex"));

// ============================================================================
// Response Schema
// ============================================================================

/// Decoded status endpoint response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    /// Upstream success flag.
    pub result: bool,
    /// Building id → raw status.
    #[serde(default, deserialize_with = "building_map")]
    pub data: BTreeMap<String, RawBuildingStatus>,
}

/// One building's status as the upstream reports it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawBuildingStatus {
    /// Free-text outage sub-type.
    #[serde(default)]
    pub sub_type: Option<String>,
    /// Outage start, `"HH:MM DD.MM.YYYY"`.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Expected restoration, `"HH:MM DD.MM.YYYY"`.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Upstream type code.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Reason codes; the schedule group id is one of them.
    #[serde(default)]
    pub sub_type_reason: Option<Vec<String>>,
    /// Unused flag, accepted in any shape.
    #[serde(default)]
    pub voluntarily: Option<Value>,
}

/// The upstream sends `[]` or `null` instead of `{}` for an empty street.
#[derive(Deserialize)]
#[serde(untagged)]
enum BuildingMap {
    Map(BTreeMap<String, RawBuildingStatus>),
    Empty([(); 0]),
    Null(()),
}

fn building_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, RawBuildingStatus>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match BuildingMap::deserialize(deserializer)? {
        BuildingMap::Map(map) => Ok(map),
        BuildingMap::Empty(_) | BuildingMap::Null(()) => Ok(BTreeMap::new()),
    }
}

/// Parses and validates a status endpoint body.
pub fn parse_status_response(body: &str) -> Result<StatusResponse, DtekError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        DtekError::parse(ParseKind::Json, "JSON status response", Some(e.to_string()))
    })?;
    serde_json::from_value(value).map_err(|e| {
        DtekError::parse(
            ParseKind::Schema,
            "{ result: bool, data: { id: status } }",
            Some(e.to_string()),
        )
    })
}

// ============================================================================
// Transform
// ============================================================================

/// Classifies an outage from its sub-type text.
///
/// Unknown or absent text is treated as [`OutageKind::Planned`]. This is a
/// policy default and may need revisiting if the upstream adds categories.
pub fn classify_outage(sub_type: Option<&str>) -> OutageKind {
    let Some(text) = sub_type else {
        return OutageKind::Planned;
    };
    let text = text.to_lowercase();
    if text.contains("екстрен") {
        OutageKind::Emergency
    } else if text.contains("стабілізац") {
        OutageKind::Stabilization
    } else {
        // Includes "планов".
        OutageKind::Planned
    }
}

/// Returns the first schedule group id found in the reason codes.
pub fn extract_group_id<S: AsRef<str>>(reasons: &[S]) -> Option<String> {
    reasons
        .iter()
        .find_map(|r| GROUP_ID_REGEX.find(r.as_ref()))
        .map(|m| m.as_str().to_string())
}

/// Converts one raw record.
pub fn transform_building(raw: RawBuildingStatus) -> BuildingStatus {
    let reasons = raw.sub_type_reason.unwrap_or_default();
    let start_date = raw.start_date.filter(|s| !s.trim().is_empty());
    let end_date = raw.end_date.filter(|s| !s.trim().is_empty());
    BuildingStatus {
        outage: classify_outage(raw.sub_type.as_deref()),
        group_id: extract_group_id(&reasons),
        starts_at: start_date.as_deref().and_then(parse_upstream_date),
        ends_at: end_date.as_deref().and_then(parse_upstream_date),
        sub_type: raw.sub_type.filter(|s| !s.trim().is_empty()),
        kind: raw.kind,
        start_date,
        end_date,
        reasons,
    }
}

/// Builds the report for one street from a validated response.
///
/// The snapshot supplies the freshness stamp and the weekly schedules of
/// every referenced group.
pub fn build_report(
    location: &str,
    street: &str,
    snapshot: &DirectorySnapshot,
    response: StatusResponse,
) -> Result<StatusReport, DtekError> {
    if !response.result {
        return Err(DtekError::validation(
            "result",
            "must be true in the status response",
        ));
    }

    let buildings: BTreeMap<String, BuildingStatus> = response
        .data
        .into_iter()
        .map(|(id, raw)| (id, transform_building(raw)))
        .collect();

    let mut report = StatusReport {
        location: location.to_string(),
        street: street.to_string(),
        updated_at: snapshot.updated_at.clone(),
        buildings,
        schedules: BTreeMap::new(),
    };
    report.schedules = snapshot.schedules_for(&report.group_ids());

    debug!(
        buildings = report.buildings.len(),
        groups = report.schedules.len(),
        "Status report built"
    );
    Ok(report)
}

// ============================================================================
// Tests
// ============================================================================
