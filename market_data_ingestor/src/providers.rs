//! Feed adapters behind one async interface.
//!
//! A provider turns [`BarsRequestParams`] into canonical [`BarSeries`], one per requested
//! symbol. Vendor quirks (column layouts, null rows, symbol echoing) stay inside the
//! adapter; callers hold an `Arc<dyn DataProvider>` and never branch on the source.
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{bar::BarSeries, request_params::BarsRequestParams};
//! use market_data_ingestor::providers::{DataProvider, ProviderError};
//!
//! struct Fixed(Vec<BarSeries>);
//!
//! #[async_trait]
//! impl DataProvider for Fixed {
//!     async fn fetch_bars(&self, _: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
//!         Ok(self.0.clone())
//!     }
//! }
//! ```

pub mod retry;
pub mod yahoo_chart;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::{bar::BarSeries, request_params::BarsRequestParams};

/// Source of hourly (or other interval) bars.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// One series per symbol in `params`, already normalized. A symbol the vendor knows
    /// nothing about may be missing from the result rather than being an error.
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError>;
}

/// Failure while constructing a provider.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid base URL {url:?}: {message}"))]
    InvalidBaseUrl {
        url: String,
        message: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid rate limit: {message}"))]
    InvalidRateLimit {
        message: String,
        backtrace: Backtrace,
    },
}

/// Failure while fetching or decoding bars.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Transport-level failure: DNS, connect, timeout, TLS.
    #[snafu(display("Request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("HTTP {status}: {body}"))]
    HttpStatus {
        status: u16,
        body: String,
        backtrace: Backtrace,
    },

    /// The vendor answered but reported an error, e.g. an unknown symbol.
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The request cannot be expressed for this vendor (interval, lookback).
    #[snafu(display("Unsupported request: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to decode provider response: {source}"))]
    Decode {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Provider bug: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },

    #[snafu(display("Provider not initialized: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

impl ProviderError {
    /// Whether repeating the same request may succeed (network hiccup, throttling, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Reqwest { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            ProviderError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
