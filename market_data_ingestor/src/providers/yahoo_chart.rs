//! Adapter for Yahoo's public `v8/finance/chart` endpoint.

pub mod params;
pub mod provider;
pub mod response;

pub use provider::{YahooChartConfig, YahooChartProvider};
