//! Maps calendar days to positions in a schedule's rotation.

use chrono::{Datelike, NaiveDate};

use crate::calendar::DATE_KEY_FORMAT;
use crate::schedule::{ScheduleType, Situation};

/// Returned by [`situation_offset`] when the position cannot be computed.
pub const UNKNOWN_OFFSET: u32 = 0;

fn cycle_length(schedule: u8) -> i64 {
    ScheduleType::from_number(schedule).map_or(1, |s| s.table().rotation_length as i64)
}

/// Position of a day within the rotation of `schedule` (1..=4) anchored by
/// the 1-based `rotation` label. `None` if there is no reference date for
/// the pair or if either date is invalid.
///
/// An impossible day such as 30 February is invalid here. It is not rolled
/// over into the following month, so it never aliases 2 March.
pub fn resolve_offset(
    day: u32,
    year: i32,
    month: u32,
    schedule: u8,
    rotation: usize,
) -> Option<u32> {
    let reference = ScheduleType::from_number(schedule)?
        .table()
        .reference_date(rotation)?;

    let target = NaiveDate::from_ymd_opt(year, month, day)?;
    let reference = NaiveDate::parse_from_str(reference, DATE_KEY_FORMAT).ok()?;

    let diff_days = target.signed_duration_since(reference).num_days();

    Some(diff_days.rem_euclid(cycle_length(schedule)) as u32)
}

/// Like [`resolve_offset`] but collapses the unknown case to
/// [`UNKNOWN_OFFSET`], which cannot be told apart from a reference day.
pub fn situation_offset(day: u32, year: i32, month: u32, schedule: u8, rotation: usize) -> u32 {
    resolve_offset(day, year, month, schedule, rotation).unwrap_or(UNKNOWN_OFFSET)
}

/// Situation label at `offset`, empty if out of range or unknown schedule.
pub fn situation_label(offset: u32, schedule: u8) -> &'static str {
    ScheduleType::from_number(schedule).map_or("", |s| s.table().situation_label(offset))
}

pub fn offset_on(date: &NaiveDate, schedule: ScheduleType, rotation: usize) -> Option<u32> {
    resolve_offset(
        date.day(),
        date.year(),
        date.month(),
        schedule.number(),
        rotation,
    )
}

/// Situation of a day, `None` when unknown or the label is empty.
pub fn situation_on(date: &NaiveDate, schedule: ScheduleType, rotation: usize) -> Option<Situation> {
    offset_on(date, schedule, rotation)
        .and_then(|offset| Situation::from_label(situation_label(offset, schedule.number())))
}
