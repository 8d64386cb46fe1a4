//! Classic daily pivot levels and the projected trade setup for the in-progress day.
//!
//! Three calendar-day periods are considered, ending at the reference bar's local day:
//! two days prior, one day prior, and the reference day. Each period with at least one
//! hourly bar yields a [`PivotZone`]. A period is completed when its end boundary is at or
//! before the last available timestamp; the in-progress period uses the reference close as
//! a proxy close and is the only one that carries a [`TradeSetup`].

use chrono::{DateTime, Days, Utc};
use chrono_tz::Tz;
use market_data_ingestor::models::bar::Bar;
use serde::Serialize;
use thiserror::Error;

use crate::{
    trend::TrendMode,
    tz::{TzError, local_date, local_midnight},
};

/// Reward to risk is fixed by construction of the stop.
pub const RISK_REWARD_RATIO: f64 = 2.0;

/// Number of day periods examined.
pub const ZONE_COUNT: usize = 3;

#[derive(Debug, Error)]
pub enum PivotError {
    #[error("cannot compute pivots on an empty series")]
    EmptySeries,
    #[error("reference index {idx} is out of range for {len} bars")]
    IndexOutOfRange { idx: usize, len: usize },
    #[error(transparent)]
    Tz(#[from] TzError),
}

/// Classic floor-trader levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct PivotLevels {
    pub pp: f64,
    pub r1: f64,
    pub r2: f64,
    pub s1: f64,
    pub s2: f64,
    pub m2: f64,
    pub m3: f64,
    pub m4: f64,
    pub m5: f64,
}

impl PivotLevels {
    pub fn classic(high: f64, low: f64, close: f64) -> Self {
        let pp = (high + low + close) / 3.0;
        let r1 = 2.0 * pp - low;
        let r2 = pp + (high - low);
        let s1 = 2.0 * pp - high;
        let s2 = pp - (high - low);
        Self {
            pp,
            r1,
            r2,
            s1,
            s2,
            m2: 0.5 * (pp + s1),
            m3: 0.5 * (pp + r1),
            m4: 0.5 * (r1 + r2),
            m5: 0.5 * (s1 + s2),
        }
    }

    /// Entry zone and targets for the given mode.
    ///
    /// Bullish: zone `[M2, PP]`, targets M4 then R2.
    /// Bearish: zone `[PP, M3]`, targets M5 then S2.
    pub fn band(&self, mode: TrendMode) -> ZoneBand {
        match mode {
            TrendMode::Bullish => ZoneBand {
                bottom: self.m2,
                top: self.pp,
                target_conservative: self.m4,
                target_aggressive: self.r2,
            },
            TrendMode::Bearish => ZoneBand {
                bottom: self.pp,
                top: self.m3,
                target_conservative: self.m5,
                target_aggressive: self.s2,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneBand {
    pub bottom: f64,
    pub top: f64,
    pub target_conservative: f64,
    pub target_aggressive: f64,
}

impl ZoneBand {
    pub fn mid(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }
}

/// Projected entry, stop and target for the in-progress period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeSetup {
    pub mode: TrendMode,
    pub entry_mid: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub target_aggressive: f64,
    pub risk_distance: f64,
    pub risk_reward_ratio: f64,
}

impl TradeSetup {
    /// The stop sits half the target distance beyond the zone mid, which makes the
    /// reward to risk exactly 2:1.
    pub fn project(levels: &PivotLevels, mode: TrendMode) -> Self {
        let band = levels.band(mode);
        let entry_mid = band.mid();
        let (risk_distance, stop_loss) = match mode {
            TrendMode::Bullish => {
                let d = band.target_conservative - entry_mid;
                (d, entry_mid - d / 2.0)
            }
            TrendMode::Bearish => {
                let d = entry_mid - band.target_conservative;
                (d, entry_mid + d / 2.0)
            }
        };
        Self {
            mode,
            entry_mid,
            stop_loss,
            target: band.target_conservative,
            target_aggressive: band.target_aggressive,
            risk_distance,
            risk_reward_ratio: RISK_REWARD_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotZone {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    #[serde(flatten)]
    pub levels: PivotLevels,
    pub period_high: f64,
    pub period_low: f64,
    pub period_close: f64,
    pub bars_count: usize,
    pub is_completed: bool,
    pub future: bool,
    /// Position among the examined periods (0 = two days prior). Kept even when an
    /// earlier period had no bars.
    pub zone_index: usize,
    /// Mode-dependent entry zone, present whenever a mode was supplied.
    pub band: Option<ZoneBand>,
    /// Only on the in-progress zone, and only when a mode was supplied.
    pub setup: Option<TradeSetup>,
}

/// Compute the pivot zones around `bars[current_idx]`.
///
/// `bars` must be sorted with unique timestamps. All bars, including those after the
/// reference index, count toward period ranges.
pub fn calculate_pivot_zones(
    bars: &[Bar],
    current_idx: usize,
    tz: Tz,
    mode: Option<TrendMode>,
) -> Result<Vec<PivotZone>, PivotError> {
    let last = bars.last().ok_or(PivotError::EmptySeries)?;
    let reference = bars.get(current_idx).ok_or(PivotError::IndexOutOfRange {
        idx: current_idx,
        len: bars.len(),
    })?;
    let today = local_date(reference.timestamp, tz);

    let mut zones = Vec::with_capacity(ZONE_COUNT);
    for zone_index in 0..ZONE_COUNT {
        let back = (ZONE_COUNT - 1 - zone_index) as u64;
        let Some(day) = today.checked_sub_days(Days::new(back)) else {
            continue;
        };
        let Some(next) = day.checked_add_days(Days::new(1)) else {
            continue;
        };
        let start = local_midnight(day, tz)?;
        let end = local_midnight(next, tz)?;

        let lo = bars.partition_point(|b| b.timestamp < start);
        let hi = bars.partition_point(|b| b.timestamp < end);
        let period = &bars[lo..hi];
        let Some(period_last) = period.last() else {
            continue;
        };

        let is_completed = end <= last.timestamp;
        let period_high = period.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let period_low = period.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let period_close = if is_completed {
            period_last.close
        } else {
            reference.close
        };

        let levels = PivotLevels::classic(period_high, period_low, period_close);
        let setup = match (is_completed, mode) {
            (false, Some(m)) => Some(TradeSetup::project(&levels, m)),
            _ => None,
        };

        zones.push(PivotZone {
            period_start: start,
            period_end: end,
            levels,
            period_high,
            period_low,
            period_close,
            bars_count: period.len(),
            is_completed,
            future: !is_completed,
            zone_index,
            band: mode.map(|m| levels.band(m)),
            setup,
        });
    }
    Ok(zones)
}

/// The in-progress zone, if the most recent zone is still running.
pub fn in_progress(zones: &[PivotZone]) -> Option<&PivotZone> {
    zones.last().filter(|z| z.future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const MSK: Tz = chrono_tz::Europe::Moscow;
    const EPS: f64 = 1e-9;

    /// Hourly bars from 00:00 MSK on 2025-03-10 with a per-day (high, low, close) shape.
    fn days(shape: &[(f64, f64, f64)], hours_last_day: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2025, 3, 9, 21, 0, 0).unwrap();
        let mut out = Vec::new();
        for (d, &(h, l, c)) in shape.iter().enumerate() {
            let n = if d + 1 == shape.len() { hours_last_day } else { 24 };
            for i in 0..n {
                let mid = (h + l) / 2.0;
                let (bh, bl) = if i == 5 { (h, l) } else { (mid, mid) };
                let close = if i + 1 == n { c } else { mid };
                out.push(Bar {
                    timestamp: start + Duration::hours((d * 24 + i) as i64),
                    open: mid,
                    high: bh,
                    low: bl,
                    close,
                    volume: 1.0,
                });
            }
        }
        out
    }

    #[test]
    fn classic_formulas() {
        let l = PivotLevels::classic(110.0, 90.0, 100.0);
        assert!((l.pp - 100.0).abs() < EPS);
        assert!((l.r1 - 110.0).abs() < EPS);
        assert!((l.r2 - 120.0).abs() < EPS);
        assert!((l.s1 - 90.0).abs() < EPS);
        assert!((l.s2 - 80.0).abs() < EPS);
        assert!((l.m2 - 95.0).abs() < EPS);
        assert!((l.m3 - 105.0).abs() < EPS);
        assert!((l.m4 - 115.0).abs() < EPS);
        assert!((l.m5 - 85.0).abs() < EPS);
    }

    #[test]
    fn setups_for_both_modes() {
        let l = PivotLevels::classic(110.0, 90.0, 100.0);

        let bull = TradeSetup::project(&l, TrendMode::Bullish);
        assert!((bull.entry_mid - 97.5).abs() < EPS);
        assert!((bull.risk_distance - 17.5).abs() < EPS);
        assert!((bull.stop_loss - 88.75).abs() < EPS);
        assert!((bull.target - 115.0).abs() < EPS);
        // reward / risk
        let rr = (bull.target - bull.entry_mid) / (bull.entry_mid - bull.stop_loss);
        assert!((rr - RISK_REWARD_RATIO).abs() < EPS);

        let bear = TradeSetup::project(&l, TrendMode::Bearish);
        assert!((bear.entry_mid - 102.5).abs() < EPS);
        assert!((bear.stop_loss - 111.25).abs() < EPS);
        assert!((bear.target - 85.0).abs() < EPS);
        assert!((bear.target_aggressive - 80.0).abs() < EPS);
    }

    #[test]
    fn three_zones_last_in_progress() {
        let bars = days(&[(110.0, 90.0, 100.0), (120.0, 100.0, 115.0), (130.0, 110.0, 125.0)], 10);
        let idx = bars.len() - 1;
        let zones = calculate_pivot_zones(&bars, idx, MSK, Some(TrendMode::Bullish)).unwrap();

        assert_eq!(zones.len(), 3);
        assert!(zones[0].is_completed && zones[1].is_completed);
        assert!(!zones[2].is_completed && zones[2].future);
        assert_eq!(zones.iter().map(|z| z.zone_index).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(zones[0].bars_count, 24);
        assert_eq!(zones[2].bars_count, 10);

        assert_eq!(zones[1].period_high, 120.0);
        assert_eq!(zones[1].period_low, 100.0);
        assert_eq!(zones[1].period_close, 115.0);
        assert_eq!(zones[2].period_close, bars[idx].close);

        assert!(zones[0].setup.is_none() && zones[1].setup.is_none());
        assert!(zones[2].setup.is_some());
        assert!(zones.iter().all(|z| z.band.is_some()));
        assert_eq!(in_progress(&zones).map(|z| z.zone_index), Some(2));

        // MSK midnight boundaries
        assert_eq!(
            zones[2].period_start,
            Utc.with_ymd_and_hms(2025, 3, 11, 21, 0, 0).unwrap()
        );
        assert_eq!(zones[2].period_end - zones[2].period_start, Duration::days(1));
    }

    #[test]
    fn day_ending_on_last_timestamp_is_completed() {
        // a bar exactly at next local midnight closes the previous day
        let mut bars = days(&[(110.0, 90.0, 100.0), (120.0, 100.0, 115.0)], 24);
        let next_midnight = bars.last().unwrap().timestamp + Duration::hours(1);
        bars.push(Bar {
            timestamp: next_midnight,
            open: 115.0,
            high: 116.0,
            low: 114.0,
            close: 115.5,
            volume: 1.0,
        });
        let zones = calculate_pivot_zones(&bars, bars.len() - 1, MSK, None).unwrap();
        assert_eq!(zones.len(), 3);
        assert!(zones[1].is_completed);
        assert!(zones[2].future);
        assert_eq!(zones[2].bars_count, 1);
        // without a mode there is no band and no setup
        assert!(zones.iter().all(|z| z.band.is_none() && z.setup.is_none()));
    }

    #[test]
    fn empty_periods_are_skipped_but_index_kept() {
        let all = days(&[(110.0, 90.0, 100.0), (120.0, 100.0, 115.0), (130.0, 110.0, 125.0)], 6);
        // drop the middle day entirely
        let bars: Vec<Bar> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| !(24..48).contains(i))
            .map(|(_, b)| b.clone())
            .collect();
        let zones = calculate_pivot_zones(&bars, bars.len() - 1, MSK, Some(TrendMode::Bearish)).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone_index, 0);
        assert_eq!(zones[1].zone_index, 2);
        assert_eq!(zones[1].setup.map(|s| s.mode), Some(TrendMode::Bearish));
    }

    #[test]
    fn earlier_reference_has_no_future_zone() {
        let bars = days(&[(110.0, 90.0, 100.0), (120.0, 100.0, 115.0), (130.0, 110.0, 125.0)], 12);
        // reference inside day two, which has completed by the last bar
        let zones = calculate_pivot_zones(&bars, 30, MSK, Some(TrendMode::Bullish)).unwrap();
        assert_eq!(zones.len(), 2);
        assert!(zones.iter().all(|z| z.is_completed && z.setup.is_none()));
        assert_eq!(zones[1].zone_index, 2);
    }

    #[test]
    fn bad_inputs() {
        assert!(matches!(
            calculate_pivot_zones(&[], 0, MSK, None),
            Err(PivotError::EmptySeries)
        ));
        let bars = days(&[(110.0, 90.0, 100.0)], 3);
        assert!(matches!(
            calculate_pivot_zones(&bars, 3, MSK, None),
            Err(PivotError::IndexOutOfRange { idx: 3, len: 3 })
        ));
    }
}
