use std::fmt;

use serde::Serialize;

/// Five ordered trend buckets; ordering follows the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendCategory {
    VeryBearish = 1,
    Bearish = 2,
    Neutral = 3,
    Bullish = 4,
    VeryBullish = 5,
}

impl TrendCategory {
    pub const fn score(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryBullish => "VERY BULLISH",
            Self::Bullish => "BULLISH",
            Self::Neutral => "NEUTRAL",
            Self::Bearish => "BEARISH",
            Self::VeryBearish => "VERY BEARISH",
        }
    }

    /// Hex color used by chart renderers.
    pub const fn color(self) -> &'static str {
        match self {
            Self::VeryBullish => "#2E7D32",
            Self::Bullish => "#4CAF50",
            Self::Neutral => "#607D8B",
            Self::Bearish => "#F44336",
            Self::VeryBearish => "#B71C1C",
        }
    }
}

impl fmt::Display for TrendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a normalized trend percentage to its category. First match wins:
///
/// | pct              | category     |
/// |------------------|--------------|
/// | `> 0.0100`       | VERY BULLISH |
/// | `>= 0.0025`      | BULLISH      |
/// | `>= -0.0025`     | NEUTRAL      |
/// | `>= -0.0100`     | BEARISH      |
/// | otherwise        | VERY BEARISH |
///
/// Callers are expected to pass a finite value; NaN falls through to VERY BEARISH.
pub fn classify(pct: f64) -> TrendCategory {
    if pct > 0.0100 {
        TrendCategory::VeryBullish
    } else if pct >= 0.0025 {
        TrendCategory::Bullish
    } else if pct >= -0.0025 {
        TrendCategory::Neutral
    } else if pct >= -0.0100 {
        TrendCategory::Bearish
    } else {
        TrendCategory::VeryBearish
    }
}
