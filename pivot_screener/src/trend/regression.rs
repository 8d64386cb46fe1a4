use serde::Serialize;

/// Trailing window used for every timeframe.
pub const DEFAULT_WINDOW: usize = 20;

/// Least-squares trend line over the trailing window with a ±2σ residual band.
///
/// `lower`, `mid` and `upper` all have the window's length and are aligned to its points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendBand {
    pub slope: f64,
    pub lower: Vec<f64>,
    pub mid: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Fit `close ~ slope * i + intercept` for `i in 0..window` over the last `window` closes.
///
/// Returns `None` when fewer than `window` closes exist or `window < 2`.
pub fn estimate_trend(closes: &[f64], window: usize) -> Option<TrendBand> {
    if window < 2 || closes.len() < window {
        return None;
    }
    let y = &closes[closes.len() - window..];
    let n = window as f64;

    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &v) in y.iter().enumerate() {
        let x = i as f64;
        sx += x;
        sy += v;
        sxy += x * v;
        sxx += x * x;
    }
    let slope = (n * sxy - sx * sy) / (n * sxx - sx * sx);
    let intercept = (sy - slope * sx) / n;

    let mid: Vec<f64> = (0..window).map(|i| slope * i as f64 + intercept).collect();

    // population std of residuals
    let resid: Vec<f64> = y.iter().zip(&mid).map(|(v, m)| v - m).collect();
    let mean = resid.iter().sum::<f64>() / n;
    let var = resid.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let half = 2.0 * var.sqrt();

    Some(TrendBand {
        slope,
        lower: mid.iter().map(|m| m - half).collect(),
        upper: mid.iter().map(|m| m + half).collect(),
        mid,
    })
}

/// Slope as a percentage of `close`, expressed per base (hourly) unit so that
/// timeframes are comparable.
pub fn normalized_trend_pct(slope: f64, close: f64, base_units: u32) -> f64 {
    slope / close * 100.0 / base_units as f64
}
