//! Instrument catalog: the built-in list plus an optional TOML replacement.
//!
//! A catalog file looks like:
//!
//! ```toml
//! [[instruments]]
//! name = "Gold"
//! ticker = "GC=F"
//! category = "Metals"
//! ```
//!
//! Loading trims names and tickers and rejects empty fields or duplicate tickers.
//! Order is significant: selections and groupings follow catalog order.

use std::{collections::HashSet, fmt};

use anyhow::{Context, bail};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Stocks,
    Crypto,
    Metals,
    Energy,
    Forex,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Instrument {
    /// Display name, e.g. "S&P 500".
    pub name: String,
    /// Feed symbol, e.g. "SPY".
    pub ticker: String,
    pub category: Category,
}

impl Instrument {
    pub fn new(name: &str, ticker: &str, category: Category) -> Self {
        Self {
            name: name.to_string(),
            ticker: ticker.to_string(),
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    pub instruments: Vec<Instrument>,
}

const BUILTIN: &[(&str, &str, Category)] = &[
    ("S&P 500", "SPY", Category::Stocks),
    ("Hang Seng", "HSI=F", Category::Stocks),
    ("NASDAQ", "QQQ", Category::Stocks),
    ("EURO STOXX 50", "FEZ", Category::Stocks),
    ("MSCI WORLD", "URTH", Category::Stocks),
    ("Bitcoin", "BTC-USD", Category::Crypto),
    ("Ethereum", "ETH-USD", Category::Crypto),
    ("Solana", "SOL-USD", Category::Crypto),
    ("Gold", "GC=F", Category::Metals),
    ("Silver", "SI=F", Category::Metals),
    ("Platinum", "PL=F", Category::Metals),
    ("Palladium", "PA=F", Category::Metals),
    ("Copper", "HG=F", Category::Metals),
    ("Brent", "BZ=F", Category::Energy),
    ("Natural Gas US", "NG=F", Category::Energy),
    ("DXY", "^DX-Y.NYB", Category::Forex),
];

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The 16 instruments shipped with the screener.
    pub fn builtin() -> Self {
        Self {
            instruments: BUILTIN
                .iter()
                .map(|&(name, ticker, category)| Instrument::new(name, ticker, category))
                .collect(),
        }
    }

    pub fn get(&self, ticker: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.ticker == ticker)
    }

    /// Instruments whose ticker was requested, in catalog order. Unknown tickers are
    /// logged and ignored.
    pub fn select<S: AsRef<str>>(&self, tickers: &[S]) -> Vec<&Instrument> {
        let wanted: HashSet<&str> = tickers.iter().map(|t| t.as_ref().trim()).collect();
        for t in &wanted {
            if self.get(t).is_none() {
                warn!(ticker = %t, "ticker not in catalog, ignored");
            }
        }
        self.instruments
            .iter()
            .filter(|i| wanted.contains(i.ticker.as_str()))
            .collect()
    }

    /// Instruments grouped by category; categories appear in first-seen order.
    pub fn by_category(&self) -> IndexMap<Category, Vec<&Instrument>> {
        let mut out: IndexMap<Category, Vec<&Instrument>> = IndexMap::new();
        for i in &self.instruments {
            out.entry(i.category).or_default().push(i);
        }
        out
    }
}

/// Summary of changes performed during normalization.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Names or tickers that changed when trimming.
    pub fields_trimmed: usize,
}

/// Trim all fields; reject empty fields and duplicate tickers.
pub fn normalize_catalog(cat: &mut Catalog) -> anyhow::Result<NormalizationReport> {
    let mut report = NormalizationReport::default();
    let mut seen = HashSet::new();

    for inst in &mut cat.instruments {
        for field in [&mut inst.name, &mut inst.ticker] {
            let trimmed = field.trim();
            if trimmed.len() != field.len() {
                *field = trimmed.to_string();
                report.fields_trimmed += 1;
            }
        }
        if inst.name.is_empty() {
            bail!("instrument name cannot be empty (ticker {:?})", inst.ticker);
        }
        if inst.ticker.is_empty() {
            bail!("ticker cannot be empty (instrument {:?})", inst.name);
        }
        if !seen.insert(inst.ticker.clone()) {
            bail!("duplicate ticker in catalog: {}", inst.ticker);
        }
    }
    if cat.instruments.is_empty() {
        bail!("catalog has no instruments");
    }
    Ok(report)
}

/// Parse and normalize a catalog from a TOML string.
pub fn load_catalog_str(toml_str: &str) -> anyhow::Result<Catalog> {
    let mut cat: Catalog = toml::from_str(toml_str).context("failed to parse catalog TOML")?;
    normalize_catalog(&mut cat).context("normalize_catalog failed")?;
    Ok(cat)
}

/// Read a catalog TOML file from disk, parse, and normalize it.
pub fn load_catalog_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Catalog> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read catalog file {}", path.as_ref().display()))?;
    load_catalog_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shape() {
        let cat = Catalog::builtin();
        assert_eq!(cat.instruments.len(), 16);
        let groups = cat.by_category();
        let keys: Vec<Category> = groups.keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                Category::Stocks,
                Category::Crypto,
                Category::Metals,
                Category::Energy,
                Category::Forex
            ]
        );
        assert_eq!(groups[&Category::Metals].len(), 5);
        assert_eq!(cat.get("^DX-Y.NYB").map(|i| i.name.as_str()), Some("DXY"));
    }

    #[test]
    fn select_keeps_catalog_order_and_drops_unknown() {
        let cat = Catalog::builtin();
        let picked = cat.select(&["GC=F", "NOPE", "SPY", "GC=F"]);
        let tickers: Vec<&str> = picked.iter().map(|i| i.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["SPY", "GC=F"]);
    }

    #[test]
    fn load_trims_and_validates() {
        let cat = load_catalog_str(
            r#"
            [[instruments]]
            name = " Gold "
            ticker = "GC=F"
            category = "Metals"

            [[instruments]]
            name = "Bitcoin"
            ticker = " BTC-USD"
            category = "Crypto"
            "#,
        )
        .unwrap();
        assert_eq!(cat.instruments[0].name, "Gold");
        assert_eq!(cat.instruments[1].ticker, "BTC-USD");
    }

    #[test]
    fn duplicate_ticker_errors() {
        let err = load_catalog_str(
            r#"
            [[instruments]]
            name = "Gold"
            ticker = "GC=F"
            category = "Metals"

            [[instruments]]
            name = "Gold again"
            ticker = "GC=F "
            category = "Metals"
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("duplicate ticker"));
    }

    #[test]
    fn unknown_field_and_category_rejected() {
        assert!(
            load_catalog_str(
                "[[instruments]]\nname = \"X\"\nticker = \"X\"\ncategory = \"Bonds\"\n"
            )
            .is_err()
        );
        assert!(
            load_catalog_str(
                "[[instruments]]\nname = \"X\"\nticker = \"X\"\ncategory = \"Forex\"\nexchange = \"ICE\"\n"
            )
            .is_err()
        );
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_fields_are_trimmed(
            names in proptest::collection::vec("[ ]{0,2}[A-Za-z]{1,6}[ ]{0,2}", 1..6),
        ) {
            let mut cat = Catalog {
                instruments: names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| Instrument {
                        name: n.clone(),
                        ticker: format!(" T{i} "),
                        category: Category::Stocks,
                    })
                    .collect(),
            };
            normalize_catalog(&mut cat).unwrap();
            for inst in &cat.instruments {
                prop_assert_eq!(inst.name.trim(), inst.name.as_str());
                prop_assert_eq!(inst.ticker.trim(), inst.ticker.as_str());
            }
        }
    }
}
