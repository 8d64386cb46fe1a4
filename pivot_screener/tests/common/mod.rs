#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use market_data_ingestor::{
    models::{
        bar::{Bar, BarSeries},
        request_params::BarsRequestParams,
        timeframe::TimeFrame,
    },
    providers::{ApiSnafu, DataProvider, ProviderError},
};
use pivot_screener::{
    Screener, ScreenerSettings,
    catalog::{Catalog, Category, Instrument},
    chart::JsonChartRenderer,
};

/// 2023-01-01 00:00 Moscow time.
pub fn msk_midnight() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 12, 31, 21, 0, 0).unwrap()
}

/// Hourly bars with H = L = O = C = `close(i)`, starting at [`msk_midnight`].
pub fn hourly_bars(n: usize, close: impl Fn(usize) -> f64) -> Vec<Bar> {
    let t0 = msk_midnight();
    (0..n)
        .map(|i| {
            let c = close(i);
            Bar {
                timestamp: t0 + chrono::Duration::hours(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 100.0,
            }
        })
        .collect()
}

/// Two years of hourly closes growing at a constant rate.
pub fn rising_two_years() -> Vec<Bar> {
    hourly_bars(730 * 24, |i| 100.0 * (0.0005 * i as f64).exp())
}

pub fn flat_two_years() -> Vec<Bar> {
    hourly_bars(730 * 24, |_| 42.0)
}

#[derive(Clone)]
pub enum Canned {
    Bars(Vec<Bar>),
    ApiError(&'static str),
    /// Never answers within any sane timeout.
    Stall,
}

/// Serves fixed responses per ticker. Unknown tickers answer with an empty list.
#[derive(Default)]
pub struct InMemoryProvider {
    responses: HashMap<String, Canned>,
}

impl InMemoryProvider {
    pub fn with(mut self, ticker: &str, canned: Canned) -> Self {
        self.responses.insert(ticker.to_string(), canned);
        self
    }
}

#[async_trait]
impl DataProvider for InMemoryProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        let mut out = Vec::new();
        for symbol in params.symbols {
            match self.responses.get(&symbol) {
                Some(Canned::Bars(bars)) => {
                    out.push(BarSeries::new(symbol, params.timeframe, bars.clone()))
                }
                Some(Canned::ApiError(message)) => return ApiSnafu { message: *message }.fail(),
                Some(Canned::Stall) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                None => {}
            }
        }
        Ok(out)
    }
}

pub fn test_catalog() -> Catalog {
    Catalog {
        instruments: vec![
            Instrument::new("S&P 500", "SPY", Category::Stocks),
            Instrument::new("Gold", "GC=F", Category::Metals),
            Instrument::new("Bitcoin", "BTC-USD", Category::Crypto),
        ],
    }
}

pub fn screener(provider: InMemoryProvider) -> Screener {
    screener_with(provider, ScreenerSettings::default())
}

pub fn screener_with(provider: InMemoryProvider, settings: ScreenerSettings) -> Screener {
    Screener::new(
        Arc::new(provider),
        Arc::new(JsonChartRenderer::default()),
        test_catalog(),
        settings,
    )
}

pub fn hourly() -> TimeFrame {
    TimeFrame::hourly()
}
