//! Wall-clock bucket mapping.
//!
//! - Buckets are computed on the local wall clock of the display zone, then the
//!   bucket start is mapped back to a UTC instant.
//! - Hour-multiple frames (1h/4h) are floored from local midnight.
//! - Day: local calendar day.
//! - Week: Monday 00:00 local, so a week spans Monday through Sunday.

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::{
    timeframe::AnalysisTimeframe,
    tz::{TzError, local_to_utc},
};

/// Local wall-clock start of the bucket that contains `ts_utc`.
pub fn bucket_start_local(ts_utc: DateTime<Utc>, tf: AnalysisTimeframe, tz: Tz) -> NaiveDateTime {
    let local = ts_utc.with_timezone(&tz).naive_local();
    let date = local.date();
    match tf {
        AnalysisTimeframe::Hour1 | AnalysisTimeframe::Hour4 => {
            let width = tf.base_units();
            let hour = local.hour() - local.hour() % width;
            date.and_time(NaiveTime::MIN) + Duration::hours(hour as i64)
        }
        AnalysisTimeframe::Day1 => date.and_time(NaiveTime::MIN),
        AnalysisTimeframe::Week1 => {
            let back = date.weekday().num_days_from_monday() as i64;
            (date - Duration::days(back)).and_time(NaiveTime::MIN)
        }
    }
}

/// UTC instant of a local bucket start.
pub fn bucket_start_utc(start_local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>, TzError> {
    local_to_utc(start_local, tz)
}
