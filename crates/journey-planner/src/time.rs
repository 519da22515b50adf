//! GTFS times are not ordinary clock times: `"25:30:00"` is a perfectly
//! normal way to write "1:30 the next morning" for a trip that started
//! before midnight. Parsing needs a reference date to turn that into an
//! actual point in time.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Parses a GTFS `HH:MM:SS` (or `H:MM:SS`) string against the calendar date
/// `reference` belongs to. Hours `>= 24` carry over into following days:
/// `days = HH / 24`, `hour = HH % 24`. Returns `None` for anything that
/// doesn't parse as three non-negative integers in range — the caller
/// decides whether that's worth logging, this function stays silent so it
/// remains trivially testable.
pub fn parse_gtfs_time(reference: NaiveDate, raw: &str) -> Option<NaiveDateTime> {
    let mut parts = raw.trim().splitn(3, ':');
    let hh: i64 = parts.next()?.parse().ok()?;
    let mm: u32 = parts.next()?.parse().ok()?;
    let ss: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || mm >= 60 || ss >= 60 || hh < 0 {
        return None;
    }
    let days = hh / 24;
    let hour = (hh % 24) as u32;
    let date = reference.checked_add_signed(Duration::days(days))?;
    let time = date.and_hms_opt(hour, mm, ss)?;
    Some(time)
}
