//! Application configuration: TOML file, environment overrides, validation.
//!
//! Every field has a default, so an empty file (or no file) is a valid configuration.
//! Resolution order is defaults, then the TOML file, then `PIVOT_SCREENER_*` variables.
//!
//! ```toml
//! display_timezone = "Europe/Moscow"
//! catalog_file = "instruments.toml"
//!
//! [feed]
//! lookback_days = 730
//! interval = "1h"
//!
//! [analysis]
//! regression_window = 20
//! agreement_policy = "directional_only"
//!
//! [runtime]
//! concurrency = 4
//! ```

use std::{num::NonZeroU32, path::PathBuf, time::Duration};

use anyhow::Context;
use chrono_tz::Tz;
use market_data_ingestor::{
    models::timeframe::{TimeFrame, TimeFrameError},
    providers::{
        retry::RetryPolicy,
        yahoo_chart::{YahooChartConfig, provider::DEFAULT_BASE_URL},
    },
};
use serde::{Deserialize, Serialize};
use shared_utils::env::{EnvVarParseError, env_override};
use thiserror::Error;

use crate::{
    ema_trend::{AgreementPolicy, EmaSettings},
    trend::{DEFAULT_WINDOW, WeightingProfile},
    tz::{DEFAULT_DISPLAY_ZONE, TzError, parse_zone},
};

pub const ENV_TZ: &str = "PIVOT_SCREENER_TZ";
pub const ENV_LOOKBACK_DAYS: &str = "PIVOT_SCREENER_LOOKBACK_DAYS";
pub const ENV_CONCURRENCY: &str = "PIVOT_SCREENER_CONCURRENCY";
pub const ENV_FEED_URL: &str = "PIVOT_SCREENER_FEED_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Env(#[from] EnvVarParseError),
    #[error("invalid feed interval: {0}")]
    Interval(#[from] TimeFrameError),
    #[error(transparent)]
    Zone(#[from] TzError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub display_timezone: Tz,
    /// Replaces the built-in instrument list when set.
    pub catalog_file: Option<PathBuf>,
    pub feed: FeedConfig,
    pub analysis: AnalysisConfig,
    pub runtime: RuntimeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            display_timezone: DEFAULT_DISPLAY_ZONE,
            catalog_file: None,
            feed: FeedConfig::default(),
            analysis: AnalysisConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedConfig {
    pub lookback_days: u32,
    /// Bar interval in `TimeFrame` notation. Only "1h" passes validation.
    pub interval: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub requests_per_second: u32,
    pub base_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            lookback_days: 730,
            interval: "1h".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            base_delay_ms: 500,
            requests_per_second: 2,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl FeedConfig {
    pub fn timeframe(&self) -> Result<TimeFrame, TimeFrameError> {
        self.interval.parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }

    pub fn provider_config(&self) -> Result<YahooChartConfig, ConfigError> {
        let requests_per_second = NonZeroU32::new(self.requests_per_second)
            .ok_or_else(|| ConfigError::Invalid("feed.requests_per_second must be >= 1".into()))?;
        Ok(YahooChartConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout(),
            requests_per_second,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub regression_window: usize,
    pub min_chart_bars: usize,
    pub min_dashboard_bars: usize,
    pub plot_window: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub ema_long: usize,
    pub rsi_period: usize,
    pub agreement_policy: AgreementPolicy,
    pub default_profile: WeightingProfile,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let ema = EmaSettings::default();
        Self {
            regression_window: DEFAULT_WINDOW,
            min_chart_bars: 50,
            min_dashboard_bars: 100,
            plot_window: 100,
            ema_fast: ema.fast,
            ema_slow: ema.slow,
            ema_long: ema.long,
            rsi_period: ema.rsi_period,
            agreement_policy: ema.policy,
            default_profile: WeightingProfile::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Instruments processed at once; 1 is sequential.
    pub concurrency: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Everything the per-instrument analysis needs, detached from the file layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub tz: Tz,
    pub regression_window: usize,
    pub min_chart_bars: usize,
    pub min_dashboard_bars: usize,
    pub plot_window: usize,
    pub ema: EmaSettings,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AppConfig::default().analysis_settings()
    }
}

impl AppConfig {
    /// Parse a TOML document on top of the defaults. No env overrides, no validation.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("failed to parse config TOML")
    }

    /// Defaults, then `path` if given, then environment overrides; validated.
    pub fn load(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("read config file {}", p.display()))?;
                Self::from_toml_str(&text)
                    .with_context(|| format!("load config file {}", p.display()))?
            }
            None => Self::default(),
        };
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(name) = env_override::<String>(ENV_TZ)? {
            self.display_timezone = parse_zone(&name)?;
        }
        if let Some(days) = env_override::<u32>(ENV_LOOKBACK_DAYS)? {
            self.feed.lookback_days = days;
        }
        if let Some(n) = env_override::<usize>(ENV_CONCURRENCY)? {
            self.runtime.concurrency = n;
        }
        if let Some(url) = env_override::<String>(ENV_FEED_URL)? {
            self.feed.base_url = url;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        let invalid = |m: &str| Err(ConfigError::Invalid(m.to_string()));

        if a.regression_window < 2 {
            return invalid("analysis.regression_window must be >= 2");
        }
        if a.ema_fast == 0 || a.ema_fast >= a.ema_slow {
            return invalid("analysis.ema_fast must be >= 1 and < ema_slow");
        }
        if a.ema_long == 0 || a.rsi_period == 0 {
            return invalid("analysis.ema_long and analysis.rsi_period must be >= 1");
        }
        if a.min_chart_bars == 0 || a.min_dashboard_bars == 0 || a.plot_window == 0 {
            return invalid("analysis bar thresholds must be >= 1");
        }
        if self.runtime.concurrency == 0 {
            return invalid("runtime.concurrency must be >= 1");
        }
        if self.feed.lookback_days == 0 {
            return invalid("feed.lookback_days must be >= 1");
        }
        if self.feed.timeout_secs == 0 {
            return invalid("feed.timeout_secs must be >= 1");
        }
        if self.feed.timeframe()? != TimeFrame::hourly() {
            return invalid("feed.interval must be \"1h\": the analysis works on hourly bars");
        }
        self.feed.provider_config()?;
        Ok(())
    }

    pub fn analysis_settings(&self) -> AnalysisSettings {
        let a = &self.analysis;
        AnalysisSettings {
            tz: self.display_timezone,
            regression_window: a.regression_window,
            min_chart_bars: a.min_chart_bars,
            min_dashboard_bars: a.min_dashboard_bars,
            plot_window: a.plot_window,
            ema: EmaSettings {
                fast: a.ema_fast,
                slow: a.ema_slow,
                long: a.ema_long,
                rsi_period: a.rsi_period,
                policy: a.agreement_policy,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.display_timezone, chrono_tz::Europe::Moscow);
        assert_eq!(cfg.feed.lookback_days, 730);
        assert_eq!(cfg.analysis.min_chart_bars, 50);
        assert_eq!(cfg.analysis.agreement_policy, AgreementPolicy::DirectionalOnly);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            display_timezone = "America/New_York"

            [analysis]
            agreement_policy = "literal"
            default_profile = "intraday_positional"

            [runtime]
            concurrency = 1
            "#,
        )
        .unwrap();
        assert_eq!(cfg.display_timezone, chrono_tz::America::New_York);
        assert_eq!(cfg.analysis.agreement_policy, AgreementPolicy::Literal);
        assert_eq!(
            cfg.analysis.default_profile,
            WeightingProfile::IntradayPositional
        );
        assert_eq!(cfg.analysis.regression_window, 20);
        assert_eq!(cfg.runtime.concurrency, 1);

        let s = cfg.analysis_settings();
        assert_eq!(s.ema.policy, AgreementPolicy::Literal);
        assert_eq!(s.tz, chrono_tz::America::New_York);
    }

    #[test]
    fn rejects_unknown_keys_and_zones() {
        assert!(AppConfig::from_toml_str("[feed]\nlookback = 3\n").is_err());
        assert!(AppConfig::from_toml_str("display_timezone = \"Mars/Olympus\"\n").is_err());
    }

    #[test]
    fn validation_rules() {
        let mut cfg = AppConfig::default();
        cfg.analysis.regression_window = 1;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = AppConfig::default();
        cfg.analysis.ema_fast = 55;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.runtime.concurrency = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.feed.interval = "1y".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::Interval(_))));

        for interval in ["1d", "15m", "1w", "4h"] {
            let cfg = AppConfig::from_toml_str(&format!("[feed]\ninterval = \"{interval}\"\n"))
                .unwrap();
            assert!(
                matches!(cfg.validate(), Err(ConfigError::Invalid(ref m)) if m.contains("feed.interval")),
                "{interval}"
            );
        }

        let mut cfg = AppConfig::default();
        cfg.feed.requests_per_second = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[feed]\nlookback_days = 30\ntimeout_secs = 5").unwrap();
        let cfg = AppConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.feed.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.feed.retry_policy().max_retries, 2);

        let err = AppConfig::load(Some(std::path::Path::new("/nonexistent/cfg.toml")))
            .unwrap_err();
        assert!(format!("{err:#}").contains("read config file"));
    }

    #[test]
    fn env_overrides_apply() {
        // Only this test touches the feed URL variable.
        unsafe { std::env::set_var(ENV_FEED_URL, "http://127.0.0.1:9") };
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides().unwrap();
        unsafe { std::env::remove_var(ENV_FEED_URL) };
        assert_eq!(cfg.feed.base_url, "http://127.0.0.1:9");
    }
}
