//! Multi-timeframe trend and pivot-zone analytics over hourly price series.
//!
//! The hourly series is aggregated into 4h, daily and weekly bars on a configurable
//! display time zone. From there two pipelines run:
//!
//! - charts: regression trend per timeframe, classification, weighted score, and daily
//!   pivot zones with a projected trade setup ([`pipeline::analyze_chart`]);
//! - dashboard: EMA crossover directions, agreement and daily RSI
//!   ([`pipeline::analyze_dashboard`]).
//!
//! [`pipeline::Screener`] drives either over a batch of catalog instruments.

pub mod aggregate;
pub mod bucket;
pub mod catalog;
pub mod chart;
pub mod config;
pub mod ema_trend;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod pipeline;
pub mod pivot;
pub mod timeframe;
pub mod trend;
pub mod tz;

pub use error::{AnalysisError, DataUnavailable};
pub use pipeline::{ChartReport, DashboardReport, Screener, ScreenerSettings};
