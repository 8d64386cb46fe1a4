use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trend::classify::TrendCategory;

/// Per-timeframe weights of a profile. Always a convex combination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub h1: f64,
    pub h4: f64,
    pub d1: f64,
}

/// Named weighting schemes for combining the 1h, 4h and 1d trend scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingProfile {
    /// Emphasises the hourly trend.
    #[default]
    IntradayLocal,
    /// Emphasises the 4h trend.
    IntradayMid,
    /// Emphasises the daily trend.
    IntradayPositional,
}

#[derive(Debug, Error)]
#[error("unknown weighting profile {0:?}")]
pub struct UnknownProfile(pub String);

impl WeightingProfile {
    pub const ALL: [WeightingProfile; 3] = [
        Self::IntradayLocal,
        Self::IntradayMid,
        Self::IntradayPositional,
    ];

    pub const fn weights(self) -> Weights {
        match self {
            Self::IntradayLocal => Weights {
                h1: 0.50,
                h4: 0.30,
                d1: 0.20,
            },
            Self::IntradayMid => Weights {
                h1: 0.20,
                h4: 0.50,
                d1: 0.30,
            },
            Self::IntradayPositional => Weights {
                h1: 0.20,
                h4: 0.30,
                d1: 0.50,
            },
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::IntradayLocal => "intraday_local",
            Self::IntradayMid => "intraday_mid",
            Self::IntradayPositional => "intraday_positional",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::IntradayLocal => "Intoday (local trend) = 1h*0.50 + 4h*0.30 + 1d*0.20",
            Self::IntradayMid => "Intoday (mid-term) = 1h*0.20 + 4h*0.50 + 1d*0.30",
            Self::IntradayPositional => "Intoday (positional) = 1h*0.20 + 4h*0.30 + 1d*0.50",
        }
    }

    /// Total lookup: unknown names fall back to [`WeightingProfile::IntradayLocal`].
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for WeightingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeightingProfile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s.trim())
            .ok_or_else(|| UnknownProfile(s.to_string()))
    }
}

/// Directional mode derived from the weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMode {
    Bullish,
    Bearish,
}

impl fmt::Display for TrendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendMode::Bullish => "bullish",
            TrendMode::Bearish => "bearish",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightedScore {
    pub value: f64,
    pub mode: TrendMode,
}

impl WeightedScore {
    /// Bullish strictly above 3.0; exactly 3.0 is bearish.
    pub fn from_value(value: f64) -> Self {
        let mode = if value > 3.0 {
            TrendMode::Bullish
        } else {
            TrendMode::Bearish
        };
        Self { value, mode }
    }

    pub fn combine(
        d1: TrendCategory,
        h4: TrendCategory,
        h1: TrendCategory,
        profile: WeightingProfile,
    ) -> Self {
        let w = profile.weights();
        let value = f64::from(h1.score()) * w.h1
            + f64::from(h4.score()) * w.h4
            + f64::from(d1.score()) * w.d1;
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TrendCategory::*;

    #[test]
    fn weights_are_convex() {
        for p in WeightingProfile::ALL {
            let w = p.weights();
            assert_eq!(w.h1 + w.h4 + w.d1, 1.0, "{p}");
        }
    }

    #[test]
    fn uniform_scores_are_fixed_points() {
        for p in WeightingProfile::ALL {
            assert_eq!(WeightedScore::combine(VeryBullish, VeryBullish, VeryBullish, p).value, 5.0);
            assert_eq!(WeightedScore::combine(VeryBearish, VeryBearish, VeryBearish, p).value, 1.0);
            let neutral = WeightedScore::combine(Neutral, Neutral, Neutral, p);
            assert_eq!(neutral.value, 3.0);
            assert_eq!(neutral.mode, TrendMode::Bearish);
        }
    }

    #[test]
    fn exact_three_is_bearish() {
        assert_eq!(WeightedScore::from_value(3.0).mode, TrendMode::Bearish);
        assert_eq!(WeightedScore::from_value(3.0000001).mode, TrendMode::Bullish);
    }

    #[test]
    fn profiles_shift_emphasis() {
        // hourly very bullish, the rest bearish
        let local = WeightedScore::combine(Bearish, Bearish, VeryBullish, WeightingProfile::IntradayLocal);
        let positional =
            WeightedScore::combine(Bearish, Bearish, VeryBullish, WeightingProfile::IntradayPositional);
        assert!((local.value - 3.5).abs() < 1e-12);
        assert_eq!(local.mode, TrendMode::Bullish);
        assert!((positional.value - 2.6).abs() < 1e-12);
        assert_eq!(positional.mode, TrendMode::Bearish);
    }

    #[test]
    fn name_lookup() {
        assert_eq!(
            WeightingProfile::from_name("intraday_mid"),
            WeightingProfile::IntradayMid
        );
        assert_eq!(
            WeightingProfile::from_name("swing"),
            WeightingProfile::IntradayLocal
        );
        assert!("swing".parse::<WeightingProfile>().is_err());
        assert!(
            WeightingProfile::IntradayPositional
                .description()
                .contains("1d*0.50")
        );
    }
}
