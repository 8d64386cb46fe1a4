//! What a chart is made of, and the boundary to whatever draws it.
//!
//! The analytics produce a [`ChartInput`]; a [`ChartRenderer`] turns it into bytes. The
//! [`ChartSummary`] is the small payload reported alongside each chart.

use std::fmt;

use chrono_tz::Tz;
use market_data_ingestor::models::bar::Bar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    pivot::{PivotZone, RISK_REWARD_RATIO, in_progress},
    timeframe::AnalysisTimeframe,
    trend::{TrendBand, TrendCategory, TrendMode, WeightedScore, WeightingProfile},
};

/// Hourly bars kept for display.
pub const PLOT_WINDOW: usize = 100;
/// Empty room reserved right of the last bar, in hours.
pub const FUTURE_HOURS: u32 = 30;
/// Horizontal extent of a pivot zone, in hours.
pub const ZONE_WIDTH: u32 = 24;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode chart: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("renderer failed: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartLayout {
    pub plot_window: usize,
    pub future_hours: u32,
    pub zone_width: u32,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            plot_window: PLOT_WINDOW,
            future_hours: FUTURE_HOURS,
            zone_width: ZONE_WIDTH,
        }
    }
}

/// One timeframe's regression result as shown in the chart legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeframeTrend {
    pub timeframe: AnalysisTimeframe,
    pub band: TrendBand,
    pub normalized_pct: f64,
    pub category: TrendCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub score: u8,
}

impl TimeframeTrend {
    pub fn new(
        timeframe: AnalysisTimeframe,
        band: TrendBand,
        normalized_pct: f64,
        category: TrendCategory,
    ) -> Self {
        Self {
            timeframe,
            band,
            normalized_pct,
            category,
            label: category.label(),
            color: category.color(),
            score: category.score(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartInput {
    pub name: String,
    pub ticker: String,
    #[serde(serialize_with = "serialize_tz")]
    pub display_zone: Tz,
    /// Trailing hourly bars, at most `layout.plot_window`.
    pub bars: Vec<Bar>,
    pub zones: Vec<PivotZone>,
    /// Ordered 1d, 4h, 1h.
    pub trends: Vec<TimeframeTrend>,
    pub weighted: WeightedScore,
    pub profile: WeightingProfile,
    pub layout: ChartLayout,
}

fn serialize_tz<S: serde::Serializer>(tz: &Tz, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(tz.name())
}

impl ChartInput {
    pub fn trend(&self, tf: AnalysisTimeframe) -> Option<&TimeframeTrend> {
        self.trends.iter().find(|t| t.timeframe == tf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeframeScores {
    #[serde(rename = "1d")]
    pub d1: u8,
    #[serde(rename = "4h")]
    pub h4: u8,
    #[serde(rename = "1h")]
    pub h1: u8,
}

/// Per-chart report payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSummary {
    pub name: String,
    pub ticker: String,
    pub weighted_score: f64,
    pub trend_mode: TrendMode,
    pub formula_type: WeightingProfile,
    pub scores: TimeframeScores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_mid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rr_ratio: Option<f64>,
}

impl From<&ChartInput> for ChartSummary {
    fn from(input: &ChartInput) -> Self {
        let score = |tf| input.trend(tf).map_or(0, |t| t.score);
        let setup = in_progress(&input.zones).and_then(|z| z.setup.as_ref());

        ChartSummary {
            name: input.name.clone(),
            ticker: input.ticker.clone(),
            weighted_score: input.weighted.value,
            trend_mode: input.weighted.mode,
            formula_type: input.profile,
            scores: TimeframeScores {
                d1: score(AnalysisTimeframe::Day1),
                h4: score(AnalysisTimeframe::Hour4),
                h1: score(AnalysisTimeframe::Hour1),
            },
            stop_loss: setup.map(|s| s.stop_loss),
            entry_mid: setup.map(|s| s.entry_mid),
            target: setup.map(|s| s.target),
            rr_ratio: setup.map(|_| RISK_REWARD_RATIO),
        }
    }
}

/// Rendered chart bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct ChartArtifact {
    pub media_type: &'static str,
    /// Suggested file extension, without the dot.
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ChartArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartArtifact")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub trait ChartRenderer: Send + Sync {
    fn render(&self, input: &ChartInput) -> Result<ChartArtifact, RenderError>;
}

/// Emits the chart input itself as a JSON document, for an external plotting step.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonChartRenderer {
    pub pretty: bool,
}

impl ChartRenderer for JsonChartRenderer {
    fn render(&self, input: &ChartInput) -> Result<ChartArtifact, RenderError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(input)?
        } else {
            serde_json::to_vec(input)?
        };
        Ok(ChartArtifact {
            media_type: "application/json",
            extension: "json",
            bytes,
        })
    }
}
