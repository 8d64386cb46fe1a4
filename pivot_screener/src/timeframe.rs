//! The fixed set of analysis timeframes derived from the hourly base series.
//!
//! ```
//! use pivot_screener::timeframe::AnalysisTimeframe;
//!
//! let tf: AnalysisTimeframe = "4h".parse().unwrap();
//! assert_eq!(tf.base_units(), 4);
//! assert_eq!(tf.to_string(), "4h");
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown analysis timeframe {0:?} (expected 1h, 4h, 1d or 1w)")]
pub struct UnknownTimeframe(pub String);

/// Bucket widths, ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnalysisTimeframe {
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "1w")]
    Week1,
}

impl AnalysisTimeframe {
    pub const ALL: [AnalysisTimeframe; 4] = [Self::Hour1, Self::Hour4, Self::Day1, Self::Week1];

    /// Number of base (hourly) units per bucket.
    pub const fn base_units(self) -> u32 {
        match self {
            Self::Hour1 => 1,
            Self::Hour4 => 4,
            Self::Day1 => 24,
            Self::Week1 => 168,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Hour1 => "1h",
            Self::Hour4 => "4h",
            Self::Day1 => "1d",
            Self::Week1 => "1w",
        }
    }
}

impl fmt::Display for AnalysisTimeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnalysisTimeframe {
    type Err = UnknownTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" => Ok(Self::Hour1),
            "4h" => Ok(Self::Hour4),
            "1d" | "d" => Ok(Self::Day1),
            "1w" | "w" => Ok(Self::Week1),
            _ => Err(UnknownTimeframe(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_roundtrip_through_fromstr() {
        for tf in AnalysisTimeframe::ALL {
            assert_eq!(tf.label().parse::<AnalysisTimeframe>().unwrap(), tf);
        }
        assert!("2h".parse::<AnalysisTimeframe>().is_err());
    }

    #[test]
    fn ordered_fine_to_coarse() {
        let units: Vec<u32> = AnalysisTimeframe::ALL.iter().map(|t| t.base_units()).collect();
        assert_eq!(units, vec![1, 4, 24, 168]);
        assert!(AnalysisTimeframe::Hour4 < AnalysisTimeframe::Day1);
    }
}
