//! Display time zone.
//!
//! Bars are stamped in UTC, but 4h blocks, days, weeks and pivot periods are cut on the
//! wall clock of a single display zone (Moscow unless configured). The aggregator, the
//! pivot calculator and the chart payload must all agree on that zone.
//!
//! Wall times that do not map to exactly one instant resolve deterministically: a repeated
//! hour takes its first occurrence, a skipped hour moves forward to the first valid minute.
//! Some zones skip midnight itself, in which case a day starts at 01:00.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

pub const DEFAULT_DISPLAY_ZONE: Tz = chrono_tz::Europe::Moscow;

/// Longest DST gap stepped over when resolving a skipped wall time.
const MAX_GAP_MINUTES: i64 = 120;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TzError {
    #[error("unknown time zone: {0}")]
    UnknownZone(String),
    #[error("local time {0} does not exist and no valid time follows within two hours")]
    Nonexistent(NaiveDateTime),
}

/// IANA name such as "Europe/Moscow".
pub fn parse_zone(name: &str) -> Result<Tz, TzError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TzError::UnknownZone(name.to_string()))
}

/// UTC instant of a local wall time.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, TzError> {
    let resolved = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, _) => first,
        LocalResult::None => (1..=MAX_GAP_MINUTES)
            .find_map(|m| tz.from_local_datetime(&(naive + Duration::minutes(m))).single())
            .ok_or(TzError::Nonexistent(naive))?,
    };
    Ok(resolved.with_timezone(&Utc))
}

/// UTC instant at which `date` begins in `tz`.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, TzError> {
    local_to_utc(date.and_time(NaiveTime::MIN), tz)
}

/// Calendar date of `ts` on the wall clock of `tz`.
pub fn local_date(ts: DateTime<Utc>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}
