//! Hourly → 4h / daily / weekly resampling.

use chrono_tz::Tz;
use market_data_ingestor::models::bar::Bar;
use tracing::debug;

use crate::{
    bucket::{bucket_start_local, bucket_start_utc},
    timeframe::AnalysisTimeframe,
    tz::TzError,
};

/// Resample `bars` (sorted, unique timestamps) into `tf` buckets aligned to `tz`.
///
/// Open is the first open, high the max, low the min, close the last close, volume the
/// sum. Only buckets with at least one contributing bar are emitted, each stamped with
/// the UTC instant of its local start. The trailing bucket may be partial.
pub fn aggregate(bars: &[Bar], tf: AnalysisTimeframe, tz: Tz) -> Result<Vec<Bar>, TzError> {
    let mut out: Vec<Bar> = Vec::new();
    let mut current: Option<(chrono::NaiveDateTime, Bar)> = None;

    for bar in bars {
        let key = bucket_start_local(bar.timestamp, tf, tz);
        match current.as_mut() {
            Some((k, acc)) if *k == key => {
                acc.high = acc.high.max(bar.high);
                acc.low = acc.low.min(bar.low);
                acc.close = bar.close;
                acc.volume += bar.volume;
            }
            _ => {
                if let Some((k, acc)) = current.take() {
                    out.push(finish(k, acc, tz)?);
                }
                current = Some((key, bar.clone()));
            }
        }
    }
    if let Some((k, acc)) = current {
        out.push(finish(k, acc, tz)?);
    }

    debug!(timeframe = %tf, input = bars.len(), output = out.len(), "aggregated");
    Ok(out)
}

fn finish(start_local: chrono::NaiveDateTime, mut acc: Bar, tz: Tz) -> Result<Bar, TzError> {
    acc.timestamp = bucket_start_utc(start_local, tz)?;
    Ok(acc)
}

/// The hourly base series together with its 4h, daily and weekly resamples.
#[derive(Debug, Clone)]
pub struct TimeframeSet {
    pub h1: Vec<Bar>,
    pub h4: Vec<Bar>,
    pub d1: Vec<Bar>,
    pub w1: Vec<Bar>,
}

impl TimeframeSet {
    pub fn build(hourly: &[Bar], tz: Tz) -> Result<Self, TzError> {
        Ok(Self {
            h1: hourly.to_vec(),
            h4: aggregate(hourly, AnalysisTimeframe::Hour4, tz)?,
            d1: aggregate(hourly, AnalysisTimeframe::Day1, tz)?,
            w1: aggregate(hourly, AnalysisTimeframe::Week1, tz)?,
        })
    }

    pub fn get(&self, tf: AnalysisTimeframe) -> &[Bar] {
        match tf {
            AnalysisTimeframe::Hour1 => &self.h1,
            AnalysisTimeframe::Hour4 => &self.h4,
            AnalysisTimeframe::Day1 => &self.d1,
            AnalysisTimeframe::Week1 => &self.w1,
        }
    }
}
