//! Moving-average and momentum primitives over close prices.
//!
//! EMA is span based with no bias correction:
//!
//! ```text
//! alpha = 2 / (span + 1)
//! EMA_0 = close_0
//! EMA_t = EMA_{t-1} + alpha * (close_t - EMA_{t-1})
//! ```
//!
//! RSI takes a simple mean of gains and losses over the last `period` deltas:
//! `RSI = 100 - 100 / (1 + mean(gains) / mean(losses))`.

/// Full EMA series, same length as `closes`. Empty input or `span == 0` gives an empty vec.
pub fn ema(closes: &[f64], span: usize) -> Vec<f64> {
    let Some(&first) = closes.first() else {
        return Vec::new();
    };
    if span == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);

    let mut out = Vec::with_capacity(closes.len());
    let mut prev = first;
    out.push(prev);
    for &c in &closes[1..] {
        // incremental form keeps a constant series exactly constant
        prev += alpha * (c - prev);
        out.push(prev);
    }
    out
}

/// Last EMA value, if any.
pub fn ema_last(closes: &[f64], span: usize) -> Option<f64> {
    ema(closes, span).last().copied()
}

/// RSI of the most recent `period` price changes.
///
/// `None` when fewer than `period + 1` closes exist or when there was no movement at all
/// (0/0). Only gains gives 100, only losses gives 0.
pub fn rsi_last(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let tail = &closes[closes.len() - period - 1..];
    let (mut gain, mut loss) = (0.0, 0.0);
    for w in tail.windows(2) {
        let d = w[1] - w[0];
        if d > 0.0 {
            gain += d;
        } else {
            loss -= d;
        }
    }
    let n = period as f64;
    let (avg_gain, avg_loss) = (gain / n, loss / n);

    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { None } else { Some(100.0) };
    }
    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - 100.0 / (1.0 + rs);
    rsi.is_finite().then_some(rsi)
}
