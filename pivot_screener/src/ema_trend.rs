//! Multi-timeframe EMA crossover dashboard.
//!
//! Per timeframe the fast/slow EMA crossover gives a direction. Adjacent timeframes that
//! agree form the mid-term (4h + 1d) and global (1d + 1w) trends, and the two agreeing
//! with each other marks the asset as STRONG. Daily RSI and the 4h price position
//! against the long EMA complete the row. No pivots, no charting.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    aggregate::TimeframeSet,
    indicators::{ema_last, rsi_last},
    timeframe::AnalysisTimeframe,
};

/// Observations required beyond the slow span before a direction is reported.
pub const WARMUP_EXTRA: usize = 10;

/// Daily bars required before RSI is attempted.
pub const MIN_DAILY_FOR_RSI: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricePosition {
    Above,
    Below,
    Equal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendStrength {
    Strong,
}

/// Whether two `neutral` readings count as agreement.
///
/// The default departs from plain equality: a flat market reports no strength
/// instead of STRONG. `Literal` restores the equality rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementPolicy {
    /// Plain equality: `neutral == neutral` agrees.
    Literal,
    /// Only bullish or bearish can agree; a flat market never reads STRONG.
    #[default]
    DirectionalOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmaSettings {
    pub fast: usize,
    pub slow: usize,
    pub long: usize,
    pub rsi_period: usize,
    pub policy: AgreementPolicy,
}

impl Default for EmaSettings {
    fn default() -> Self {
        Self {
            fast: 21,
            slow: 55,
            long: 200,
            rsi_period: 14,
            policy: AgreementPolicy::default(),
        }
    }
}

/// One dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmaTrendResult {
    pub name: String,
    pub ticker: String,
    pub trend_1h: Option<TrendDirection>,
    pub trend_4h: Option<TrendDirection>,
    pub trend_1d: Option<TrendDirection>,
    pub trend_1w: Option<TrendDirection>,
    pub mid_term: Option<TrendDirection>,
    pub global_trend: Option<TrendDirection>,
    pub strength: Option<TrendStrength>,
    pub rsi_14d: Option<f64>,
    pub price_vs_200ema_4h: Option<PricePosition>,
}

/// Fast/slow crossover direction; `None` with fewer than `max(fast, slow) + 10` closes.
pub fn ema_direction(closes: &[f64], fast: usize, slow: usize) -> Option<TrendDirection> {
    if closes.len() < fast.max(slow) + WARMUP_EXTRA {
        return None;
    }
    let f = ema_last(closes, fast)?;
    let s = ema_last(closes, slow)?;
    Some(if f > s {
        TrendDirection::Bullish
    } else if f < s {
        TrendDirection::Bearish
    } else {
        TrendDirection::Neutral
    })
}

/// Last close against EMA(`period`); `None` with fewer than `period + 10` closes.
pub fn price_vs_ema(closes: &[f64], period: usize) -> Option<PricePosition> {
    if closes.len() < period + WARMUP_EXTRA {
        return None;
    }
    let last = *closes.last()?;
    let ema = ema_last(closes, period)?;
    Some(if last > ema {
        PricePosition::Above
    } else if last < ema {
        PricePosition::Below
    } else {
        PricePosition::Equal
    })
}

/// Common direction of `a` and `b`, if they agree under `policy`.
pub fn agree(
    a: Option<TrendDirection>,
    b: Option<TrendDirection>,
    policy: AgreementPolicy,
) -> Option<TrendDirection> {
    let (a, b) = (a?, b?);
    if a != b {
        return None;
    }
    match (policy, a) {
        (AgreementPolicy::DirectionalOnly, TrendDirection::Neutral) => None,
        _ => Some(a),
    }
}

/// `(mid_term, global, strength)` from the 4h, 1d and 1w directions.
pub fn trend_strength(
    trend_4h: Option<TrendDirection>,
    trend_1d: Option<TrendDirection>,
    trend_1w: Option<TrendDirection>,
    policy: AgreementPolicy,
) -> (
    Option<TrendDirection>,
    Option<TrendDirection>,
    Option<TrendStrength>,
) {
    let mid_term = agree(trend_4h, trend_1d, policy);
    let global = agree(trend_1d, trend_1w, policy);
    let strength = match (mid_term, global) {
        (Some(m), Some(g)) if m == g => Some(TrendStrength::Strong),
        _ => None,
    };
    (mid_term, global, strength)
}

fn closes(set: &TimeframeSet, tf: AnalysisTimeframe) -> Vec<f64> {
    set.get(tf).iter().map(|b| b.close).collect()
}

/// Build the dashboard row for one instrument. Values that lack history come back `None`.
pub fn analyze_ema_trends(
    name: &str,
    ticker: &str,
    set: &TimeframeSet,
    settings: &EmaSettings,
) -> EmaTrendResult {
    let c1h = closes(set, AnalysisTimeframe::Hour1);
    let c4h = closes(set, AnalysisTimeframe::Hour4);
    let c1d = closes(set, AnalysisTimeframe::Day1);
    let c1w = closes(set, AnalysisTimeframe::Week1);

    let dir = |c: &[f64]| ema_direction(c, settings.fast, settings.slow);
    let (trend_1h, trend_4h, trend_1d, trend_1w) = (dir(&c1h), dir(&c4h), dir(&c1d), dir(&c1w));

    let (mid_term, global_trend, strength) =
        trend_strength(trend_4h, trend_1d, trend_1w, settings.policy);

    let rsi_14d = if c1d.len() >= MIN_DAILY_FOR_RSI {
        rsi_last(&c1d, settings.rsi_period)
    } else {
        None
    };
    let price_vs_200ema_4h = price_vs_ema(&c4h, settings.long);

    debug!(
        ticker,
        ?trend_1h,
        ?trend_4h,
        ?trend_1d,
        ?trend_1w,
        ?strength,
        rsi = ?rsi_14d,
        "ema trends"
    );

    EmaTrendResult {
        name: name.to_string(),
        ticker: ticker.to_string(),
        trend_1h,
        trend_4h,
        trend_1d,
        trend_1w,
        mid_term,
        global_trend,
        strength,
        rsi_14d,
        price_vs_200ema_4h,
    }
}
