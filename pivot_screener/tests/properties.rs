use chrono::{Duration, TimeZone, Utc};
use market_data_ingestor::models::bar::Bar;
use pivot_screener::{
    aggregate::aggregate,
    bucket::{bucket_start_local, bucket_start_utc},
    pivot::{PivotLevels, TradeSetup},
    timeframe::AnalysisTimeframe,
    trend::{TrendCategory, TrendMode, WeightedScore, WeightingProfile, classify},
};
use proptest::prelude::*;

fn category() -> impl Strategy<Value = TrendCategory> {
    prop_oneof![
        Just(TrendCategory::VeryBearish),
        Just(TrendCategory::Bearish),
        Just(TrendCategory::Neutral),
        Just(TrendCategory::Bullish),
        Just(TrendCategory::VeryBullish),
    ]
}

fn profile() -> impl Strategy<Value = WeightingProfile> {
    prop_oneof![
        Just(WeightingProfile::IntradayLocal),
        Just(WeightingProfile::IntradayMid),
        Just(WeightingProfile::IntradayPositional),
    ]
}

/// (high, low, close) with low <= close <= high.
fn hlc() -> impl Strategy<Value = (f64, f64, f64)> {
    (1.0f64..10_000.0, 0.0f64..500.0, 0.0f64..=1.0)
        .prop_map(|(low, range, t)| (low + range, low, low + range * t))
}

/// Sorted hourly-aligned bars with gaps of 1 to 5 hours.
fn bar_series() -> impl Strategy<Value = Vec<Bar>> {
    proptest::collection::vec(
        (1i64..=5, 1.0f64..1000.0, 0.0f64..50.0, 0.0f64..1e6),
        1..300,
    )
    .prop_map(|rows| {
        let mut ts = Utc.with_ymd_and_hms(2024, 10, 25, 0, 0, 0).unwrap();
        rows.into_iter()
            .map(|(gap, low, range, volume)| {
                ts += Duration::hours(gap);
                Bar {
                    timestamp: ts,
                    open: low + range / 2.0,
                    high: low + range,
                    low,
                    close: low + range / 3.0,
                    volume,
                }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn pivot_levels_are_ordered((h, l, c) in hlc()) {
        let p = PivotLevels::classic(h, l, c);
        let eps = 1e-9 * h.max(1.0);
        prop_assert!(p.s2 <= p.s1 + eps);
        prop_assert!(p.s1 <= p.pp + eps);
        prop_assert!(p.pp <= p.r1 + eps);
        prop_assert!(p.r1 <= p.r2 + eps);
        prop_assert!((p.pp - (h + l + c) / 3.0).abs() <= 1e-9 * h.max(1.0));
        // R1 = 2PP - L and S1 = 2PP - H, so the pair is one range apart
        prop_assert!(((p.r1 - p.s1) - (h - l)).abs() <= eps * 10.0);
        prop_assert!(((p.r2 - p.s2) - 2.0 * (h - l)).abs() <= eps * 10.0);
        prop_assert!(((p.m2 - (p.pp + p.s1) / 2.0)).abs() <= eps);
        prop_assert!(((p.m3 - (p.pp + p.r1) / 2.0)).abs() <= eps);
    }

    #[test]
    fn setups_have_fixed_reward_to_risk((h, l, c) in hlc()) {
        prop_assume!(h - l > 1e-3);
        let p = PivotLevels::classic(h, l, c);

        let bull = TradeSetup::project(&p, TrendMode::Bullish);
        prop_assert!(bull.stop_loss < bull.entry_mid && bull.entry_mid < bull.target);
        prop_assert!(bull.target < bull.target_aggressive);
        let rr = (bull.target - bull.entry_mid) / (bull.entry_mid - bull.stop_loss);
        prop_assert!((rr - 2.0).abs() < 1e-6);

        let bear = TradeSetup::project(&p, TrendMode::Bearish);
        prop_assert!(bear.target < bear.entry_mid && bear.entry_mid < bear.stop_loss);
        prop_assert!(bear.target_aggressive < bear.target);
        let rr = (bear.entry_mid - bear.target) / (bear.stop_loss - bear.entry_mid);
        prop_assert!((rr - 2.0).abs() < 1e-6);
    }

    #[test]
    fn weighted_score_stays_in_range(d1 in category(), h4 in category(), h1 in category(), p in profile()) {
        let s = WeightedScore::combine(d1, h4, h1, p);
        prop_assert!((1.0..=5.0).contains(&s.value));
        prop_assert_eq!(s.mode == TrendMode::Bullish, s.value > 3.0);
    }

    #[test]
    fn classify_agrees_with_score_order(a in -1.0f64..1.0, b in -1.0f64..1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify(lo).score() <= classify(hi).score());
    }

    #[test]
    fn aggregation_conserves_totals(bars in bar_series()) {
        let tz_list = [chrono_tz::Europe::Moscow, chrono_tz::America::New_York];
        for tz in tz_list {
            for tf in AnalysisTimeframe::ALL {
                let out = aggregate(&bars, tf, tz).unwrap();
                prop_assert!(!out.is_empty());
                prop_assert!(out.len() <= bars.len());

                let vol_in: f64 = bars.iter().map(|b| b.volume).sum();
                let vol_out: f64 = out.iter().map(|b| b.volume).sum();
                prop_assert!((vol_in - vol_out).abs() <= 1e-6 * vol_in.max(1.0));

                let max_in = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
                let max_out = out.iter().map(|b| b.high).fold(f64::MIN, f64::max);
                prop_assert_eq!(max_in, max_out);

                let min_in = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
                let min_out = out.iter().map(|b| b.low).fold(f64::MAX, f64::min);
                prop_assert_eq!(min_in, min_out);

                prop_assert_eq!(out[0].open, bars[0].open);
                prop_assert_eq!(out.last().unwrap().close, bars.last().unwrap().close);

                let groups: Vec<&[Bar]> = bars
                    .chunk_by(|a, b| {
                        bucket_start_local(a.timestamp, tf, tz)
                            == bucket_start_local(b.timestamp, tf, tz)
                    })
                    .collect();
                prop_assert_eq!(groups.len(), out.len());
                for (group, bucket) in groups.iter().zip(&out) {
                    let start = bucket_start_local(group[0].timestamp, tf, tz);
                    prop_assert_eq!(bucket.timestamp, bucket_start_utc(start, tz).unwrap());
                    let high = group.iter().map(|b| b.high).fold(f64::MIN, f64::max);
                    let low = group.iter().map(|b| b.low).fold(f64::MAX, f64::min);
                    let volume: f64 = group.iter().map(|b| b.volume).sum();
                    prop_assert_eq!(bucket.high, high);
                    prop_assert_eq!(bucket.low, low);
                    prop_assert_eq!(bucket.volume, volume);
                    prop_assert_eq!(bucket.open, group[0].open);
                    prop_assert_eq!(bucket.close, group[group.len() - 1].close);
                }
            }
        }
    }

    #[test]
    fn buckets_are_increasing_without_dst(bars in bar_series()) {
        for tf in AnalysisTimeframe::ALL {
            let out = aggregate(&bars, tf, chrono_tz::Europe::Moscow).unwrap();
            prop_assert!(out.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            prop_assert!(out[0].timestamp <= bars[0].timestamp);
        }
    }
}
