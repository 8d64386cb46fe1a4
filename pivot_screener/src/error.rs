//! Per-instrument failure reasons.
//!
//! Every instrument in a batch resolves to `Result<_, AnalysisError>`; the batch driver turns
//! failures into `"{name} ({ticker}): {reason}"` entries and keeps going.

use std::time::Duration;

use market_data_ingestor::providers::ProviderError;
use thiserror::Error;

use crate::{chart::RenderError, pivot::PivotError, timeframe::AnalysisTimeframe, tz::TzError};

/// The feed could not supply a usable series.
#[derive(Debug, Error)]
pub enum DataUnavailable {
    #[error("fetch failed: {0}")]
    Fetch(#[source] ProviderError),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("no data returned")]
    Empty,
    #[error("insufficient data ({have} bars, need {need})")]
    TooFewBars { have: usize, need: usize },
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    DataUnavailable(#[from] DataUnavailable),

    /// Enough bars overall, but not for one derived value the result cannot do without.
    #[error("insufficient history for {timeframe} trend: need {need} observations, have {have}")]
    InsufficientHistory {
        timeframe: AnalysisTimeframe,
        need: usize,
        have: usize,
    },

    #[error("computation failed: {0}")]
    Computation(String),
}

impl From<PivotError> for AnalysisError {
    fn from(e: PivotError) -> Self {
        AnalysisError::Computation(format!("pivot zones: {e}"))
    }
}

impl From<TzError> for AnalysisError {
    fn from(e: TzError) -> Self {
        AnalysisError::Computation(format!("time zone: {e}"))
    }
}

impl From<RenderError> for AnalysisError {
    fn from(e: RenderError) -> Self {
        AnalysisError::Computation(format!("render: {e}"))
    }
}

impl AnalysisError {
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, AnalysisError::DataUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let e: AnalysisError = DataUnavailable::TooFewBars { have: 12, need: 50 }.into();
        assert_eq!(e.to_string(), "insufficient data (12 bars, need 50)");
        assert!(e.is_data_unavailable());

        let e = AnalysisError::InsufficientHistory {
            timeframe: AnalysisTimeframe::Day1,
            need: 20,
            have: 3,
        };
        assert!(e.to_string().contains("1d trend"));

        let e: AnalysisError = PivotError::EmptySeries.into();
        assert!(matches!(e, AnalysisError::Computation(_)));
    }
}
