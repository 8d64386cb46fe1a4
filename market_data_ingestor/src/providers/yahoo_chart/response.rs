use chrono::DateTime;
use serde::Deserialize;

use crate::models::bar::Bar;

#[derive(Deserialize, Debug)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Deserialize, Debug)]
pub struct ChartBody {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartApiError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartApiError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Unix seconds, one per row of the quote columns.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
pub struct ChartMeta {
    pub symbol: String,
    #[serde(rename = "exchangeTimezoneName", default)]
    pub exchange_timezone: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
}

/// Column-oriented OHLCV; any cell may be `null` (halted or illiquid hours).
#[derive(Deserialize, Debug, Default)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

fn cell(col: &[Option<f64>], i: usize) -> Option<f64> {
    col.get(i).copied().flatten()
}

impl ChartResult {
    /// Flatten the columnar payload into rows.
    ///
    /// Rows missing any of open/high/low/close are skipped; a missing volume counts as 0.
    pub fn into_bars(self) -> Vec<Bar> {
        let Some(q) = self.indicators.quote.into_iter().next() else {
            return Vec::new();
        };
        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &secs)| {
                let timestamp = DateTime::from_timestamp(secs, 0)?;
                Some(Bar {
                    timestamp,
                    open: cell(&q.open, i)?,
                    high: cell(&q.high, i)?,
                    low: cell(&q.low, i)?,
                    close: cell(&q.close, i)?,
                    volume: cell(&q.volume, i).unwrap_or(0.0),
                })
            })
            .collect()
    }
}
