//! Per-instrument pipelines and the batch drivers around them.
//!
//! Chart pipeline: hourly series, aggregation, one regression per timeframe, classification,
//! weighted score, pivot zones, then a [`ChartInput`] handed to the renderer.
//! Dashboard pipeline: hourly series, all four timeframes, EMA trend row.
//!
//! Instruments are independent. A failure in one becomes an entry in the report's `errors`
//! and never stops the batch. Results keep catalog order whatever the concurrency.

use std::{sync::Arc, time::Duration};

use futures::{StreamExt, stream};
use market_data_ingestor::{
    models::{bar::BarSeries, request_params::BarsRequestParams, timeframe::TimeFrame},
    providers::DataProvider,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    aggregate::{TimeframeSet, aggregate},
    catalog::{Catalog, Instrument},
    chart::{ChartArtifact, ChartInput, ChartLayout, ChartRenderer, ChartSummary, TimeframeTrend},
    config::{AnalysisSettings, AppConfig, ConfigError},
    ema_trend::{EmaTrendResult, analyze_ema_trends},
    error::{AnalysisError, DataUnavailable},
    pivot::calculate_pivot_zones,
    timeframe::AnalysisTimeframe,
    trend::{WeightedScore, WeightingProfile, classify, estimate_trend, normalized_trend_pct},
};

/// Fetch-side knobs for the batch drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub timeframe: TimeFrame,
    pub lookback_days: u32,
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeframe: TimeFrame::hourly(),
            lookback_days: 730,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenerSettings {
    pub analysis: AnalysisSettings,
    pub fetch: FetchSettings,
    pub concurrency: usize,
}

impl Default for ScreenerSettings {
    fn default() -> Self {
        Self {
            analysis: AnalysisSettings::default(),
            fetch: FetchSettings::default(),
            concurrency: 4,
        }
    }
}

impl ScreenerSettings {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            analysis: cfg.analysis_settings(),
            fetch: FetchSettings {
                timeframe: cfg.feed.timeframe()?,
                lookback_days: cfg.feed.lookback_days,
                timeout: cfg.feed.timeout(),
            },
            concurrency: cfg.runtime.concurrency,
        })
    }
}

fn require_hourly(series: &BarSeries) -> Result<(), AnalysisError> {
    if series.timeframe == TimeFrame::hourly() {
        Ok(())
    } else {
        Err(AnalysisError::Computation(format!(
            "expected 1h bars, got {}",
            series.timeframe
        )))
    }
}

/// Chart analysis for one instrument. Pure: no I/O, no rendering.
///
/// Uses the most recent bar as the reference point for the pivot zones.
pub fn analyze_chart(
    instrument: &Instrument,
    series: &BarSeries,
    profile: WeightingProfile,
    settings: &AnalysisSettings,
) -> Result<ChartInput, AnalysisError> {
    require_hourly(series)?;
    let bars = &series.bars;
    if bars.len() < settings.min_chart_bars {
        return Err(DataUnavailable::TooFewBars {
            have: bars.len(),
            need: settings.min_chart_bars,
        }
        .into());
    }

    let h4 = aggregate(bars, AnalysisTimeframe::Hour4, settings.tz)?;
    let d1 = aggregate(bars, AnalysisTimeframe::Day1, settings.tz)?;

    let mut trends = Vec::with_capacity(3);
    for (tf, tf_bars) in [
        (AnalysisTimeframe::Day1, d1.as_slice()),
        (AnalysisTimeframe::Hour4, h4.as_slice()),
        (AnalysisTimeframe::Hour1, bars.as_slice()),
    ] {
        let closes: Vec<f64> = tf_bars.iter().map(|b| b.close).collect();
        let band = estimate_trend(&closes, settings.regression_window).ok_or(
            AnalysisError::InsufficientHistory {
                timeframe: tf,
                need: settings.regression_window,
                have: closes.len(),
            },
        )?;
        let last_close = closes.last().copied().unwrap_or_default();
        let pct = normalized_trend_pct(band.slope, last_close, tf.base_units());
        if !pct.is_finite() {
            return Err(AnalysisError::Computation(format!(
                "{tf} trend is not finite (slope {}, close {last_close})",
                band.slope
            )));
        }
        let category = classify(pct);
        debug!(ticker = %instrument.ticker, timeframe = %tf, slope = band.slope, pct, %category, "trend");
        trends.push(TimeframeTrend::new(tf, band, pct, category));
    }

    let weighted = WeightedScore::combine(
        trends[0].category,
        trends[1].category,
        trends[2].category,
        profile,
    );
    let zones = calculate_pivot_zones(bars, bars.len() - 1, settings.tz, Some(weighted.mode))?;

    let layout = ChartLayout {
        plot_window: settings.plot_window,
        ..ChartLayout::default()
    };
    let tail = bars[bars.len().saturating_sub(layout.plot_window)..].to_vec();

    Ok(ChartInput {
        name: instrument.name.clone(),
        ticker: instrument.ticker.clone(),
        display_zone: settings.tz,
        bars: tail,
        zones,
        trends,
        weighted,
        profile,
        layout,
    })
}

/// Dashboard row for one instrument. Values without enough history come back `None`.
pub fn analyze_dashboard(
    instrument: &Instrument,
    series: &BarSeries,
    settings: &AnalysisSettings,
) -> Result<EmaTrendResult, AnalysisError> {
    require_hourly(series)?;
    if series.len() < settings.min_dashboard_bars {
        return Err(DataUnavailable::TooFewBars {
            have: series.len(),
            need: settings.min_dashboard_bars,
        }
        .into());
    }
    let set = TimeframeSet::build(&series.bars, settings.tz)?;
    Ok(analyze_ema_trends(
        &instrument.name,
        &instrument.ticker,
        &set,
        &settings.ema,
    ))
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartOutput {
    pub summary: ChartSummary,
    #[serde(skip)]
    pub artifact: ChartArtifact,
}

#[derive(Debug, Default, Serialize)]
pub struct ChartReport {
    pub charts: Vec<ChartOutput>,
    pub errors: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct DashboardReport {
    pub rows: Vec<EmaTrendResult>,
    pub errors: Vec<String>,
}

fn failure_entry(instrument: &Instrument, err: &AnalysisError) -> String {
    format!("{} ({}): {}", instrument.name, instrument.ticker, err)
}

/// Missing data is routine; anything else is a defect worth the full error chain.
fn log_failure(instrument: &Instrument, err: &AnalysisError, what: &str) {
    if err.is_data_unavailable() {
        warn!(ticker = %instrument.ticker, error = %err, "{what} skipped");
    } else {
        error!(ticker = %instrument.ticker, error = ?err, "{what} failed");
    }
}

/// Batch driver over a catalog, a data provider and a renderer.
pub struct Screener {
    provider: Arc<dyn DataProvider>,
    renderer: Arc<dyn ChartRenderer>,
    catalog: Catalog,
    settings: ScreenerSettings,
}

impl Screener {
    pub fn new(
        provider: Arc<dyn DataProvider>,
        renderer: Arc<dyn ChartRenderer>,
        catalog: Catalog,
        settings: ScreenerSettings,
    ) -> Self {
        Self {
            provider,
            renderer,
            catalog,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &ScreenerSettings {
        &self.settings
    }

    /// Hourly series for one instrument, normalized and non-empty.
    pub async fn fetch_series(&self, instrument: &Instrument) -> Result<BarSeries, AnalysisError> {
        let fetch = &self.settings.fetch;
        let params = BarsRequestParams {
            symbols: vec![instrument.ticker.clone()],
            timeframe: fetch.timeframe,
            lookback_days: fetch.lookback_days,
        };

        let series = match tokio::time::timeout(fetch.timeout, self.provider.fetch_bars(params)).await {
            Err(_) => return Err(DataUnavailable::Timeout(fetch.timeout).into()),
            Ok(Err(e)) => return Err(DataUnavailable::Fetch(e).into()),
            Ok(Ok(series)) => series,
        };

        // feeds may echo a canonicalized symbol; fall back to the first series
        let position = series
            .iter()
            .position(|s| s.symbol == instrument.ticker)
            .unwrap_or(0);
        let Some(mut series) = series.into_iter().nth(position) else {
            return Err(DataUnavailable::Empty.into());
        };

        let report = series.normalize();
        if report.malformed_dropped + report.duplicates_dropped > 0 {
            debug!(
                ticker = %instrument.ticker,
                malformed = report.malformed_dropped,
                duplicates = report.duplicates_dropped,
                "normalized series"
            );
        }
        if series.is_empty() {
            return Err(DataUnavailable::Empty.into());
        }
        Ok(series)
    }

    async fn chart_one(
        &self,
        instrument: &Instrument,
        profile: WeightingProfile,
    ) -> Result<ChartOutput, AnalysisError> {
        let series = self.fetch_series(instrument).await?;
        let input = analyze_chart(instrument, &series, profile, &self.settings.analysis)?;
        let artifact = self.renderer.render(&input)?;
        Ok(ChartOutput {
            summary: ChartSummary::from(&input),
            artifact,
        })
    }

    async fn dashboard_one(&self, instrument: &Instrument) -> Result<EmaTrendResult, AnalysisError> {
        let series = self.fetch_series(instrument).await?;
        analyze_dashboard(instrument, &series, &self.settings.analysis)
    }

    /// Charts for the requested tickers, in catalog order.
    pub async fn generate_charts<S: AsRef<str>>(
        &self,
        tickers: &[S],
        profile: WeightingProfile,
    ) -> ChartReport {
        let instruments = self.catalog.select(tickers);
        info!(count = instruments.len(), profile = %profile, "generating charts");

        let outcomes: Vec<_> = stream::iter(instruments)
            .map(|inst| async move { (inst, self.chart_one(inst, profile).await) })
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut report = ChartReport::default();
        for (inst, outcome) in outcomes {
            match outcome {
                Ok(chart) => {
                    info!(
                        ticker = %inst.ticker,
                        score = chart.summary.weighted_score,
                        mode = %chart.summary.trend_mode,
                        "chart ready"
                    );
                    report.charts.push(chart);
                }
                Err(e) => {
                    log_failure(inst, &e, "chart");
                    report.errors.push(failure_entry(inst, &e));
                }
            }
        }
        report
    }

    /// EMA trend rows for the requested tickers, in catalog order.
    pub async fn generate_dashboard<S: AsRef<str>>(&self, tickers: &[S]) -> DashboardReport {
        let instruments = self.catalog.select(tickers);
        info!(count = instruments.len(), "generating trend dashboard");

        let outcomes: Vec<_> = stream::iter(instruments)
            .map(|inst| async move { (inst, self.dashboard_one(inst).await) })
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut report = DashboardReport::default();
        for (inst, outcome) in outcomes {
            match outcome {
                Ok(row) => {
                    info!(ticker = %inst.ticker, strength = ?row.strength, "trend row ready");
                    report.rows.push(row);
                }
                Err(e) => {
                    log_failure(inst, &e, "trend row");
                    report.errors.push(failure_entry(inst, &e));
                }
            }
        }
        report
    }
}
