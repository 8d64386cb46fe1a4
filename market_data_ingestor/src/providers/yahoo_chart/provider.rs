use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use indexmap::IndexMap;
use nonzero_ext::nonzero;
use reqwest::{Client, Url, header};
use snafu::ResultExt;
use tracing::{debug, warn};

use crate::{
    models::{
        bar::{Bar, BarSeries},
        request_params::BarsRequestParams,
    },
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, DecodeSnafu, HttpStatusSnafu,
        InvalidBaseUrlSnafu, ProviderError, ProviderInitError, ReqwestSnafu, ValidationSnafu,
        yahoo_chart::{
            params::construct_params,
            response::{ChartEnvelope, ChartResult},
        },
    },
};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// the endpoint rejects requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) market_data_ingestor";

/// Connection settings for [`YahooChartProvider`].
#[derive(Debug, Clone)]
pub struct YahooChartConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub requests_per_second: NonZeroU32,
}

impl Default for YahooChartConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            requests_per_second: nonzero!(2u32),
        }
    }
}

pub struct YahooChartProvider {
    client: Client,
    base_url: Url,
    limiter: DefaultDirectRateLimiter,
}

impl YahooChartProvider {
    /// Creates a new provider. No credentials are needed for the public chart endpoint.
    pub fn new(config: YahooChartConfig) -> Result<Self, ProviderInitError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            InvalidBaseUrlSnafu {
                url: config.base_url.clone(),
                message: e.to_string(),
            }
            .build()
        })?;
        if base_url.cannot_be_a_base() {
            return InvalidBaseUrlSnafu {
                url: config.base_url,
                message: "URL cannot carry a path",
            }
            .fail();
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url,
            limiter: RateLimiter::direct(Quota::per_second(config.requests_per_second)),
        })
    }

    /// `{base}/v8/finance/chart/{symbol}` with the symbol percent-encoded as one segment.
    fn chart_url(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ValidationSnafu {
                    message: "base URL cannot carry a path",
                }
                .build()
            })?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    async fn fetch_symbol(
        &self,
        symbol: &str,
        query: &[(String, String)],
    ) -> Result<Vec<Bar>, ProviderError> {
        self.limiter.until_ready().await;

        let url = self.chart_url(symbol)?;
        debug!(%url, symbol, "requesting chart");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        let body = response.text().await.context(ReqwestSnafu)?;

        // Yahoo reports unknown symbols as 404 with a JSON error body
        let envelope: Option<ChartEnvelope> = serde_json::from_str(&body).ok();
        if let Some(err) = envelope.as_ref().and_then(|e| e.chart.error.as_ref()) {
            return ApiSnafu {
                message: format!("{}: {}", err.code, err.description),
            }
            .fail();
        }
        if !status.is_success() {
            let mut body = body;
            body.truncate(200);
            return HttpStatusSnafu {
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let envelope = match envelope {
            Some(env) => env,
            None => serde_json::from_str::<ChartEnvelope>(&body).context(DecodeSnafu)?,
        };
        let result: Option<ChartResult> = envelope
            .chart
            .result
            .and_then(|results| results.into_iter().next());
        let Some(result) = result else {
            return ApiSnafu {
                message: format!("empty chart result for {symbol}"),
            }
            .fail();
        };
        if result.meta.symbol != symbol {
            warn!(requested = symbol, returned = %result.meta.symbol, "symbol mismatch in chart response");
        }

        debug!(
            symbol,
            exchange_tz = result.meta.exchange_timezone.as_deref().unwrap_or("unknown"),
            "chart received"
        );
        Ok(result.into_bars())
    }
}

#[async_trait]
impl DataProvider for YahooChartProvider {
    async fn fetch_bars(&self, params: BarsRequestParams) -> Result<Vec<BarSeries>, ProviderError> {
        let query = construct_params(&params)?;

        let mut all_bars: IndexMap<String, Vec<Bar>> = IndexMap::new();
        for symbol in &params.symbols {
            let bars = self.fetch_symbol(symbol, &query).await?;
            all_bars.entry(symbol.clone()).or_default().extend(bars);
        }

        let result = all_bars
            .into_iter()
            .map(|(symbol, bars)| {
                let mut series = BarSeries::new(symbol, params.timeframe, bars);
                let report = series.normalize();
                if report.duplicates_dropped + report.malformed_dropped > 0 {
                    debug!(symbol = %series.symbol, ?report, "normalized feed series");
                }
                series
            })
            .collect();

        Ok(result)
    }
}
