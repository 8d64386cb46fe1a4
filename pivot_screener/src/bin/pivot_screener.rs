use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use market_data_ingestor::providers::{retry::RetryingProvider, yahoo_chart::YahooChartProvider};
use pivot_screener::{
    Screener, ScreenerSettings,
    catalog::{Catalog, load_catalog_path},
    chart::JsonChartRenderer,
    config::AppConfig,
    logging::init_logging,
    pipeline::ChartReport,
    trend::WeightingProfile,
};
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Multi-timeframe trend and pivot zone screener")]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Trend charts with pivot zones.
    Charts(ChartsCmd),
    /// EMA trend dashboard.
    Trends(TickersArg),
    /// List the instrument catalog by category.
    Catalog,
    /// List the weighting profiles.
    Profiles,
}

#[derive(Args)]
struct TickersArg {
    /// Comma-separated tickers; all catalog instruments when omitted.
    #[arg(long, value_delimiter = ',')]
    tickers: Vec<String>,
}

#[derive(Args)]
struct ChartsCmd {
    #[command(flatten)]
    tickers: TickersArg,

    /// Weighting profile; the configured default when omitted.
    #[arg(long)]
    profile: Option<WeightingProfile>,

    /// Directory receiving one rendered artifact per chart.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

fn load_catalog(cfg: &AppConfig) -> Result<Catalog> {
    match &cfg.catalog_file {
        Some(path) => load_catalog_path(path),
        None => Ok(Catalog::builtin()),
    }
}

fn resolve_tickers(catalog: &Catalog, requested: Vec<String>) -> Vec<String> {
    if requested.is_empty() {
        catalog.instruments.iter().map(|i| i.ticker.clone()).collect()
    } else {
        requested
    }
}

fn build_screener(cfg: &AppConfig, catalog: Catalog) -> Result<Screener> {
    let settings = ScreenerSettings::from_config(cfg)?;
    let provider = YahooChartProvider::new(cfg.feed.provider_config()?)
        .context("failed to build market data provider")?;
    let provider = RetryingProvider::new(provider, cfg.feed.retry_policy());
    Ok(Screener::new(
        Arc::new(provider),
        Arc::new(JsonChartRenderer { pretty: true }),
        catalog,
        settings,
    ))
}

fn write_artifacts(report: &ChartReport, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    for chart in &report.charts {
        let file_stem: String = chart
            .summary
            .ticker
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = dir.join(format!("{file_stem}.{}", chart.artifact.extension));
        std::fs::write(&path, &chart.artifact.bytes)
            .with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "chart written");
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs)?;

    let cfg = AppConfig::load(cli.config.as_deref())?;
    let catalog = load_catalog(&cfg)?;

    match cli.cmd {
        Cmd::Charts(ChartsCmd {
            tickers,
            profile,
            out_dir,
        }) => {
            let tickers = resolve_tickers(&catalog, tickers.tickers);
            let profile = profile.unwrap_or(cfg.analysis.default_profile);
            let screener = build_screener(&cfg, catalog)?;
            let report = screener.generate_charts(&tickers, profile).await;
            if let Some(dir) = out_dir {
                write_artifacts(&report, &dir)?;
            }
            print_json(&report)?;
        }
        Cmd::Trends(TickersArg { tickers }) => {
            let tickers = resolve_tickers(&catalog, tickers);
            let screener = build_screener(&cfg, catalog)?;
            let report = screener.generate_dashboard(&tickers).await;
            print_json(&report)?;
        }
        Cmd::Catalog => {
            for (category, instruments) in catalog.by_category() {
                println!("{category}:");
                for i in instruments {
                    println!("  {:<16} {}", i.ticker, i.name);
                }
            }
        }
        Cmd::Profiles => {
            for p in WeightingProfile::ALL {
                println!("{:<20} {}", p.name(), p.description());
            }
        }
    }

    Ok(())
}
