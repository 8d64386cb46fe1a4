//! OHLCV bars as every feed adapter hands them back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::timeframe::TimeFrame;

/// One interval of trading, stamped at the interval open in UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Zero for instruments the feed reports without volume (forex, indices).
    pub volume: f64,
}

impl Bar {
    /// True when every price is finite and non-negative and the volume is finite.
    pub fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p >= 0.0)
            && self.volume.is_finite()
    }
}

/// Bars of one ticker at one interval, as returned for a single request symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// Feed ticker, e.g. "SPY", "BTC-USD", "GC=F".
    pub symbol: String,
    pub timeframe: TimeFrame,
    pub bars: Vec<Bar>,
}

/// What [`BarSeries::normalize`] had to fix.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Bars removed because a price was negative or non-finite.
    pub malformed_dropped: usize,
    /// Bars removed because a later bar carried the same timestamp.
    pub duplicates_dropped: usize,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, timeframe: TimeFrame, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    /// Bring the series into canonical shape: strictly increasing, unique timestamps
    /// and well-formed prices only.
    ///
    /// On duplicate timestamps the last occurrence wins.
    pub fn normalize(&mut self) -> NormalizeReport {
        let mut report = NormalizeReport::default();

        let before = self.bars.len();
        self.bars.retain(Bar::is_well_formed);
        report.malformed_dropped = before - self.bars.len();

        // stable sort keeps feed order among equal timestamps
        self.bars.sort_by_key(|b| b.timestamp);

        let before = self.bars.len();
        let mut out: Vec<Bar> = Vec::with_capacity(before);
        for bar in self.bars.drain(..) {
            match out.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => *prev = bar,
                _ => out.push(bar),
            }
        }
        report.duplicates_dropped = before - out.len();
        self.bars = out;
        report
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
