use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The de-duplicated, upper-cased set of symbols a user asked for.
///
/// Input order is preserved because the first symbol drives single-ticker
/// views such as the OHLC surface.
///
/// Deserialization runs the same normalization as [`TickerSet::parse`], so a
/// deserialized set is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TickerSet(Vec<String>);

impl TickerSet {
    /// Parses free-text input such as `"aapl, MSFT,,aapl "`.
    ///
    /// Entries are comma-split, trimmed and upper-cased; empty and duplicate
    /// entries are discarded. Returns `CoreError::EmptyInput` if nothing remains.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        Self::from_entries(input.split(','))
    }

    fn from_entries<'a>(entries: impl IntoIterator<Item = &'a str>) -> Result<Self, CoreError> {
        let mut symbols: Vec<String> = Vec::new();
        for entry in entries {
            let symbol = entry.trim().to_uppercase();
            if symbol.is_empty() || symbols.contains(&symbol) {
                continue;
            }
            if symbol.chars().any(|c| c.is_whitespace() || c == ',') {
                return Err(CoreError::InvalidInput(
                    "ticker".to_string(),
                    format!("'{}' is not a single symbol", symbol),
                ));
            }
            symbols.push(symbol);
        }

        if symbols.is_empty() {
            return Err(CoreError::EmptyInput);
        }
        Ok(Self(symbols))
    }

    pub fn symbols(&self) -> &[String] {
        &self.0
    }

    /// The first symbol the user entered.
    pub fn first(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The symbols in sorted order, suitable for keying a cache.
    pub fn cache_key(&self) -> Vec<String> {
        let mut sorted = self.0.clone();
        sorted.sort();
        sorted
    }
}

impl TryFrom<Vec<String>> for TickerSet {
    type Error = CoreError;

    fn try_from(entries: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_entries(entries.iter().map(String::as_str))
    }
}

impl From<TickerSet> for Vec<String> {
    fn from(set: TickerSet) -> Self {
        set.0
    }
}

impl fmt::Display for TickerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}
