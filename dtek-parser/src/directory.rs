//! Directory page extraction.
//!
//! Turns the raw HTML of a region's outage page into a validated
//! [`DirectorySnapshot`]. The steps short-circuit in this order:
//!
//! 1. Anti-forgery token (or bot interstitial detection when it is missing)
//! 2. `DisconSchedule.streets` and `DisconSchedule.fact`, both required
//! 3. `DisconSchedule.preset` and the daily grid inside `fact`, both optional
//! 4. Structural validation of the assembled snapshot

use std::collections::BTreeMap;

use scraper::Html;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use dtek_core::{DirectorySnapshot, DtekError, ParseKind, Region};

use crate::html;
use crate::schedule;
use crate::script::{self, Assignment};

/// Location → streets assignment.
pub const STREETS: Assignment<'static> = Assignment::new("DisconSchedule", "streets");

/// Freshness stamp and daily grid assignment.
pub const FACT: Assignment<'static> = Assignment::new("DisconSchedule", "fact");

/// Weekly schedule table assignment.
pub const PRESET: Assignment<'static> = Assignment::new("DisconSchedule", "preset");

/// Parses a directory page.
///
/// `region` is only used to label a [`DtekError::RegionUnavailable`].
#[instrument(skip(raw), fields(bytes = raw.len()))]
pub fn parse_directory(raw: &str, region: Option<Region>) -> Result<DirectorySnapshot, DtekError> {
    let document = Html::parse_document(raw);

    let Some(csrf_token) = html::csrf_token(&document) else {
        if html::is_bot_interstitial(raw) {
            warn!("Directory page is a bot-protection interstitial");
            return Err(DtekError::RegionUnavailable { region });
        }
        return Err(DtekError::parse(
            ParseKind::Html,
            r#"<meta name="csrf-token"> with a content attribute"#,
            None,
        ));
    };

    let scripts = html::inline_scripts(&document);
    debug!(scripts = scripts.len(), "Scanning inline scripts");

    let streets_value = required(&scripts, STREETS)?;
    let (locations, streets) = read_streets(&streets_value)?;

    let fact = required(&scripts, FACT)?;
    let updated_at = fact
        .get("update")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            DtekError::parse(
                ParseKind::Schema,
                "string property `update` in DisconSchedule.fact",
                Some(fact.get("update").map_or("nothing", kind_of).to_string()),
            )
        })?;

    let schedules = match script::find_assignment(&scripts, PRESET)
        .and_then(|v| v.map(|v| schedule::table_from_preset(&v)).transpose())
    {
        Ok(table) => table,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable weekly schedule");
            None
        }
    };

    let daily = match schedule::daily_from_fact(&fact) {
        Ok(daily) => daily.filter(|d| !d.is_empty()),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable daily schedule");
            None
        }
    };

    let snapshot = DirectorySnapshot {
        csrf_token,
        updated_at,
        locations,
        streets,
        schedules,
        daily,
    };
    snapshot.validate()?;

    debug!(
        locations = snapshot.locations.len(),
        groups = snapshot.schedules.as_ref().map_or(0, BTreeMap::len),
        "Directory parsed"
    );
    Ok(snapshot)
}

fn required(scripts: &[String], target: Assignment<'_>) -> Result<Value, DtekError> {
    script::find_assignment(scripts, target)?.ok_or_else(|| {
        DtekError::parse(
            ParseKind::Script,
            format!("an inline script assigning {}", target.needle()),
            None,
        )
    })
}

/// Reads `{ location: [street, ...] }`, keeping upstream key order for the
/// location list.
fn read_streets(value: &Value) -> Result<(Vec<String>, BTreeMap<String, Vec<String>>), DtekError> {
    let object: &Map<String, Value> = value.as_object().ok_or_else(|| {
        DtekError::parse(
            ParseKind::Schema,
            "object DisconSchedule.streets",
            Some(kind_of(value).to_string()),
        )
    })?;

    let mut locations = Vec::with_capacity(object.len());
    let mut streets = BTreeMap::new();
    for (location, list) in object {
        let names = list
            .as_array()
            .and_then(|items| {
                items
                    .iter()
                    .map(|s| s.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
            })
            .ok_or_else(|| {
                DtekError::parse(
                    ParseKind::Schema,
                    format!("array of street names for {location:?}"),
                    Some(kind_of(list).to_string()),
                )
            })?;
        locations.push(location.clone());
        streets.insert(location.clone(), names);
    }
    Ok((locations, streets))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================
