//! Hourly grid to range compression.
//!
//! The upstream publishes one code per hour, keyed `"1"`..`"24"`, where key
//! `k` covers `[k-1, k)`. Seven codes exist:
//!
//! | code      | first half | second half |
//! |-----------|------------|-------------|
//! | `yes`     | yes        | yes         |
//! | `no`      | no         | no          |
//! | `maybe`   | maybe      | maybe       |
//! | `first`   | no         | yes         |
//! | `second`  | yes        | no          |
//! | `mfirst`  | maybe      | yes         |
//! | `msecond` | yes        | maybe       |
//!
//! Consecutive ranges with the same status that share a boundary are merged
//! in a single left-to-right pass. Missing hours and unknown codes emit
//! nothing.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use dtek_core::{
    DailySchedules, DaySchedule, DtekError, ParseKind, ScheduleRange, ScheduleStatus,
    ScheduleTable,
};

// ============================================================================
// Slot Codes
// ============================================================================

/// Raw status code for one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCode {
    /// Power on for the whole hour.
    Yes,
    /// Power off for the whole hour.
    No,
    /// Possible outage for the whole hour.
    Maybe,
    /// Off for the first half, on for the second.
    First,
    /// On for the first half, off for the second.
    Second,
    /// Possible outage in the first half, on in the second.
    MaybeFirst,
    /// On in the first half, possible outage in the second.
    MaybeSecond,
}

impl SlotCode {
    /// Parses an upstream code.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            "maybe" => Some(Self::Maybe),
            "first" => Some(Self::First),
            "second" => Some(Self::Second),
            "mfirst" => Some(Self::MaybeFirst),
            "msecond" => Some(Self::MaybeSecond),
            _ => None,
        }
    }

    /// Status of the first and second half of the hour.
    pub fn halves(self) -> (ScheduleStatus, ScheduleStatus) {
        use ScheduleStatus::{Maybe, No, Yes};
        match self {
            Self::Yes => (Yes, Yes),
            Self::No => (No, No),
            Self::Maybe => (Maybe, Maybe),
            Self::First => (No, Yes),
            Self::Second => (Yes, No),
            Self::MaybeFirst => (Maybe, Yes),
            Self::MaybeSecond => (Yes, Maybe),
        }
    }

    /// Returns true for the four codes that split the hour.
    pub fn is_split(self) -> bool {
        let (a, b) = self.halves();
        a != b
    }
}

// ============================================================================
// Compression
// ============================================================================

/// Appends a range, extending the previous one when it has the same status
/// and ends where the new one starts.
#[allow(clippy::float_cmp)]
fn push_merged(out: &mut DaySchedule, range: ScheduleRange) {
    if let Some(last) = out.last_mut() {
        if last.status == range.status && last.to == range.from {
            last.to = range.to;
            return;
        }
    }
    out.push(range);
}

/// Compresses one day of hour slots into ordered, merged ranges.
///
/// Keys outside `1..=24` are ignored.
pub fn compress_day(slots: &BTreeMap<u8, SlotCode>) -> DaySchedule {
    let mut out = DaySchedule::new();
    for (&hour, &code) in slots.range(1..=24) {
        let end = f64::from(hour);
        let start = end - 1.0;
        let (first, second) = code.halves();
        if code.is_split() {
            push_merged(&mut out, ScheduleRange::new(start, start + 0.5, first));
            push_merged(&mut out, ScheduleRange::new(start + 0.5, end, second));
        } else {
            push_merged(&mut out, ScheduleRange::new(start, end, first));
        }
    }
    out
}

/// Re-merges an already ordered range list.
pub fn merge_ranges<I: IntoIterator<Item = ScheduleRange>>(ranges: I) -> DaySchedule {
    let mut out = DaySchedule::new();
    for range in ranges {
        push_merged(&mut out, range);
    }
    out
}

/// Reads an hour-key → code object.
///
/// Non-numeric keys and unknown codes are dropped. Returns `None` if the
/// value is not an object.
pub fn slots_from_value(value: &Value) -> Option<BTreeMap<u8, SlotCode>> {
    let object = value.as_object()?;
    let mut slots = BTreeMap::new();
    for (key, code) in object {
        let Ok(hour) = key.trim().parse::<u8>() else {
            continue;
        };
        match code.as_str().and_then(SlotCode::parse) {
            Some(code) => {
                slots.insert(hour, code);
            }
            None => trace!(hour, code = %code, "Skipping unknown slot code"),
        }
    }
    Some(slots)
}

// ============================================================================
// Tables
// ============================================================================

/// Builds the weekly table from the `preset` object.
///
/// Expects `data: { group: { "1".."7": { "1".."24": code } } }`. Groups and
/// days that are not objects are skipped.
pub fn table_from_preset(preset: &Value) -> Result<ScheduleTable, DtekError> {
    let data = preset.get("data").and_then(Value::as_object).ok_or_else(|| {
        DtekError::parse(
            ParseKind::Schema,
            "object property `data` in DisconSchedule.preset",
            Some(describe(preset.get("data"))),
        )
    })?;

    let mut table = ScheduleTable::new();
    for (group, days) in data {
        let Some(days) = days.as_object() else {
            continue;
        };
        let mut week = BTreeMap::new();
        for (day, hours) in days {
            if let Some(slots) = slots_from_value(hours) {
                week.insert(day.clone(), compress_day(&slots));
            }
        }
        table.insert(group.clone(), week);
    }
    Ok(table)
}

/// Builds the actual per-day schedules from the `fact` object.
///
/// Returns `Ok(None)` when the object carries no `data` at all.
pub fn daily_from_fact(fact: &Value) -> Result<Option<DailySchedules>, DtekError> {
    let Some(data) = fact.get("data") else {
        return Ok(None);
    };
    let data = data.as_object().ok_or_else(|| {
        DtekError::parse(
            ParseKind::Schema,
            "object property `data` in DisconSchedule.fact",
            Some(describe(Some(data))),
        )
    })?;

    let mut daily = DailySchedules {
        today: fact.get("today").and_then(as_timestamp),
        days: BTreeMap::new(),
    };
    for (day, groups) in data {
        let (Ok(day), Some(groups)) = (day.trim().parse::<i64>(), groups.as_object()) else {
            continue;
        };
        let compressed = groups
            .iter()
            .filter_map(|(group, hours)| {
                slots_from_value(hours).map(|slots| (group.clone(), compress_day(&slots)))
            })
            .collect();
        daily.days.insert(day, compressed);
    }
    Ok(Some(daily))
}

fn as_timestamp(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "nothing".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(_)) => "boolean".to_string(),
        Some(Value::Number(_)) => "number".to_string(),
        Some(Value::String(_)) => "string".to_string(),
        Some(Value::Array(_)) => "array".to_string(),
        Some(Value::Object(_)) => "object".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(codes: &[(u8, &str)]) -> BTreeMap<u8, SlotCode> {
        codes
            .iter()
            .map(|(h, c)| (*h, SlotCode::parse(c).unwrap()))
            .collect()
    }

    fn r(from: f64, to: f64, status: ScheduleStatus) -> ScheduleRange {
        ScheduleRange::new(from, to, status)
    }

    #[test]
    fn test_all_yes_collapses_to_one_range() {
        let slots: BTreeMap<u8, SlotCode> = (1..=24).map(|h| (h, SlotCode::Yes)).collect();
        assert_eq!(compress_day(&slots), vec![r(0.0, 24.0, ScheduleStatus::Yes)]);
    }

    #[test]
    fn test_merge_rule() {
        let ranges = compress_day(&day(&[
            (1, "yes"),
            (2, "yes"),
            (3, "no"),
            (4, "no"),
            (5, "maybe"),
            (6, "yes"),
        ]));
        assert_eq!(
            ranges,
            vec![
                r(0.0, 2.0, ScheduleStatus::Yes),
                r(2.0, 4.0, ScheduleStatus::No),
                r(4.0, 5.0, ScheduleStatus::Maybe),
                r(5.0, 6.0, ScheduleStatus::Yes),
            ]
        );
        for pair in ranges.windows(2) {
            assert!(
                !(pair[0].status == pair[1].status && pair[0].to == pair[1].from),
                "unmerged neighbours: {pair:?}"
            );
        }
    }

    #[test]
    fn test_split_codes() {
        use ScheduleStatus::{Maybe, No, Yes};
        let cases = [
            ("first", No, Yes),
            ("second", Yes, No),
            ("mfirst", Maybe, Yes),
            ("msecond", Yes, Maybe),
        ];
        for (code, first, second) in cases {
            let ranges = compress_day(&day(&[(10, code)]));
            assert_eq!(
                ranges,
                vec![r(9.0, 9.5, first), r(9.5, 10.0, second)],
                "code {code}"
            );
            assert!(ranges.iter().all(|x| (x.hours() - 0.5).abs() < f64::EPSILON));
        }
    }

    #[test]
    fn test_split_merges_with_neighbours() {
        let ranges = compress_day(&day(&[(1, "no"), (2, "first"), (3, "yes")]));
        assert_eq!(
            ranges,
            vec![
                r(0.0, 1.5, ScheduleStatus::No),
                r(1.5, 3.0, ScheduleStatus::Yes),
            ]
        );
    }

    #[test]
    fn test_missing_hours_are_skipped() {
        let ranges = compress_day(&day(&[(1, "yes"), (3, "yes"), (24, "no")]));
        assert_eq!(
            ranges,
            vec![
                r(0.0, 1.0, ScheduleStatus::Yes),
                r(2.0, 3.0, ScheduleStatus::Yes),
                r(23.0, 24.0, ScheduleStatus::No),
            ]
        );
    }

    #[test]
    fn test_recompression_is_idempotent() {
        let ranges = compress_day(&day(&[
            (1, "yes"),
            (2, "msecond"),
            (3, "maybe"),
            (4, "no"),
            (6, "second"),
            (7, "no"),
        ]));
        assert_eq!(merge_ranges(ranges.clone()), ranges);
    }

    // ========================================================================
    // Grid Sweeps
    // ========================================================================

    const ALL_CODES: [SlotCode; 7] = [
        SlotCode::Yes,
        SlotCode::No,
        SlotCode::Maybe,
        SlotCode::First,
        SlotCode::Second,
        SlotCode::MaybeFirst,
        SlotCode::MaybeSecond,
    ];

    /// Checks ordering, disjointness, maximal merging, coverage and
    /// idempotent re-merging of one compressed grid.
    #[allow(clippy::float_cmp)]
    fn assert_well_formed(slots: &BTreeMap<u8, SlotCode>) {
        let ranges = compress_day(slots);
        for range in &ranges {
            assert!(range.from < range.to, "empty range {range:?} for {slots:?}");
        }
        for pair in ranges.windows(2) {
            assert!(pair[0].to <= pair[1].from, "overlap or disorder {pair:?} for {slots:?}");
            assert!(
                !(pair[0].status == pair[1].status && pair[0].to == pair[1].from),
                "unmerged neighbours {pair:?} for {slots:?}"
            );
        }
        let covered: f64 = ranges.iter().map(ScheduleRange::hours).sum();
        let expected = f64::from(u8::try_from(slots.len()).unwrap());
        assert!((covered - expected).abs() < 1e-9, "coverage for {slots:?}");
        assert_eq!(merge_ranges(ranges.clone()), ranges, "re-merge of {slots:?}");
    }

    #[test]
    fn test_every_three_hour_window() {
        // Each of three adjacent hours is one of the seven codes or missing.
        let options: Vec<Option<SlotCode>> = std::iter::once(None)
            .chain(ALL_CODES.iter().copied().map(Some))
            .collect();
        let mut grids = 0;
        for a in &options {
            for b in &options {
                for c in &options {
                    let slots: BTreeMap<u8, SlotCode> = [(11, *a), (12, *b), (13, *c)]
                        .into_iter()
                        .filter_map(|(hour, code)| code.map(|code| (hour, code)))
                        .collect();
                    assert_well_formed(&slots);
                    grids += 1;
                }
            }
        }
        assert_eq!(grids, 512);
    }

    #[test]
    fn test_generated_full_day_grids() {
        // xorshift64, fixed seed so failures reproduce.
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        for _ in 0..500 {
            let mut slots = BTreeMap::new();
            for hour in 1..=24u8 {
                // One value in eight leaves the hour out.
                let pick = usize::try_from(next() % 8).unwrap();
                if let Some(code) = ALL_CODES.get(pick) {
                    slots.insert(hour, *code);
                }
            }
            assert_well_formed(&slots);
        }
    }

    #[test]
    fn test_slots_from_value_is_lenient() {
        let slots = slots_from_value(&json!({
            "1": "yes", "2": "bogus", "x": "no", "25": "no", "3": 1, "4": "mfirst"
        }))
        .unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.get(&4), Some(&SlotCode::MaybeFirst));
        // Hour 25 is parsed but dropped by the compressor.
        assert_eq!(compress_day(&slots).last().unwrap().to, 4.0);
        assert!(slots_from_value(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_table_from_preset() {
        let preset = json!({
            "sch_names": { "GPV1.1": "Черга 1.1" },
            "data": {
                "GPV1.1": {
                    "1": { "1": "yes", "2": "no", "3": "no" },
                    "2": { "1": "first" }
                },
                "GPV1.2": "corrupt"
            }
        });
        let table = table_from_preset(&preset).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table["GPV1.1"]["1"],
            vec![
                r(0.0, 1.0, ScheduleStatus::Yes),
                r(1.0, 3.0, ScheduleStatus::No),
            ]
        );
        assert_eq!(table["GPV1.1"]["2"].len(), 2);

        assert!(table_from_preset(&json!({ "days": {} })).is_err());
    }

    #[test]
    fn test_daily_from_fact() {
        let fact = json!({
            "update": "19.10.2026 10:35",
            "today": 1_760_821_200,
            "data": {
                "1760821200": { "GPV2.1": { "1": "no", "2": "no" } },
                "not-a-day": {}
            }
        });
        let daily = daily_from_fact(&fact).unwrap().unwrap();
        assert_eq!(daily.today, Some(1_760_821_200));
        assert_eq!(daily.days.len(), 1);
        assert_eq!(
            daily.today_for("GPV2.1"),
            Some(&vec![r(0.0, 2.0, ScheduleStatus::No)])
        );

        assert_eq!(daily_from_fact(&json!({ "update": "x" })).unwrap(), None);
        assert!(daily_from_fact(&json!({ "data": "oops" })).is_err());
    }
}
