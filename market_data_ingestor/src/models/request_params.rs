use serde::{Deserialize, Serialize};

use crate::models::timeframe::TimeFrame;

/// Lookback used by the analytics: two years of hourly history.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 730;

/// Universal parameters for requesting time-series bar data from any market data provider.
///
/// This struct is designed to be vendor-agnostic. It is intended as the standard input for all
/// [`DataProvider`](crate::providers::DataProvider) implementations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// List of symbols to request (e.g., `["SPY"]`, `["GC=F"]`, `["BTC-USD"]`).
    pub symbols: Vec<String>,

    /// The time interval for each bar (e.g., 1 hour).
    ///
    /// **Validation of allowed values is performed by each data provider implementation,
    /// according to their own API rules.**
    pub timeframe: TimeFrame,

    /// How many calendar days of history to request, counted back from now.
    pub lookback_days: u32,
}

impl BarsRequestParams {
    /// Hourly bars for one symbol over the default lookback.
    pub fn hourly(symbol: impl Into<String>) -> Self {
        Self {
            symbols: vec![symbol.into()],
            timeframe: TimeFrame::hourly(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}
