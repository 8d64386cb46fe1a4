//! Trend estimation, classification, and multi-timeframe scoring.

pub mod classify;
pub mod regression;
pub mod score;

pub use classify::{TrendCategory, classify};
pub use regression::{DEFAULT_WINDOW, TrendBand, estimate_trend, normalized_trend_pct};
pub use score::{TrendMode, WeightedScore, WeightingProfile};
