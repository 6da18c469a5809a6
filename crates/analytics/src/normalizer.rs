use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::{Field, Quote, RawResponse, RawTable, TickerSet};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// One ticker's cleaned daily bars: ascending dates, no duplicates, every
/// field populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSeries {
    pub ticker: String,
    pub quotes: Vec<Quote>,
}

impl TickerSeries {
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.quotes.iter().map(|q| q.date).collect()
    }

    /// One column of the series as decimals.
    pub fn field(&self, field: Field) -> Vec<Decimal> {
        self.quotes.iter().map(|q| q.value(field)).collect()
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.field(Field::Close)
    }

    pub fn opens(&self) -> Vec<Decimal> {
        self.field(Field::Open)
    }

    pub fn volumes(&self) -> Vec<u64> {
        self.quotes.iter().map(|q| q.volume).collect()
    }

    /// The last `n` bars, or all of them if there are fewer.
    pub fn tail(&self, n: usize) -> &[Quote] {
        &self.quotes[self.quotes.len().saturating_sub(n)..]
    }
}

/// Every requested ticker's series, in the order the user entered them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSeries {
    series: Vec<TickerSeries>,
}

impl NormalizedSeries {
    /// The series of the first requested ticker.
    pub fn first(&self) -> Option<&TickerSeries> {
        self.series.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TickerSeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Canonicalizes a provider response into one clean series per ticker.
///
/// A `Flat` table is only accepted for a single-ticker request. For a
/// `MultiTicker` response each requested ticker's own table is selected.
/// Processing stops at the first ticker that is missing a field or has no
/// usable rows.
pub fn normalize(raw: &RawResponse, tickers: &TickerSet) -> Result<NormalizedSeries, AnalyticsError> {
    let mut series = Vec::with_capacity(tickers.len());

    match raw {
        RawResponse::Flat(table) => {
            if tickers.len() != 1 {
                return Err(AnalyticsError::ShapeMismatch {
                    requested: tickers.len(),
                });
            }
            series.push(normalize_table(tickers.first(), table)?);
        }
        RawResponse::MultiTicker(tables) => {
            for ticker in tickers.iter() {
                let table = tables
                    .get(ticker)
                    .or_else(|| {
                        tables
                            .iter()
                            .find(|(key, _)| key.eq_ignore_ascii_case(ticker))
                            .map(|(_, table)| table)
                    })
                    .ok_or_else(|| AnalyticsError::EmptyResult {
                        ticker: ticker.to_string(),
                    })?;
                series.push(normalize_table(ticker, table)?);
            }
        }
    }

    Ok(NormalizedSeries { series })
}

fn normalize_table(ticker: &str, table: &RawTable) -> Result<TickerSeries, AnalyticsError> {
    if table.is_empty() {
        return Err(AnalyticsError::EmptyResult {
            ticker: ticker.to_string(),
        });
    }

    let mut columns: Vec<&[Option<Decimal>]> = Vec::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        let cells = table.column(field).ok_or_else(|| AnalyticsError::MissingField {
            ticker: ticker.to_string(),
            field,
        })?;
        if cells.len() != table.len() {
            return Err(AnalyticsError::MalformedColumn {
                ticker: ticker.to_string(),
                field,
                expected: table.len(),
                actual: cells.len(),
            });
        }
        columns.push(cells);
    }

    // Keyed by date so duplicates collapse (last one wins) and output is sorted.
    let mut rows: BTreeMap<NaiveDate, Quote> = BTreeMap::new();
    let mut dropped = 0usize;
    for (i, &date) in table.dates.iter().enumerate() {
        match complete_row(date, i, &columns) {
            Some(quote) => {
                rows.insert(date, quote);
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!(ticker, dropped, "Dropped incomplete rows from provider data");
    }
    if rows.is_empty() {
        return Err(AnalyticsError::EmptyResult {
            ticker: ticker.to_string(),
        });
    }

    tracing::debug!(ticker, rows = rows.len(), "Normalized series");
    Ok(TickerSeries {
        ticker: ticker.to_string(),
        quotes: rows.into_values().collect(),
    })
}

/// Builds the quote at row `i`, or `None` if any cell is empty or the volume
/// is not a non-negative whole number. `columns` is in `Field::ALL` order.
fn complete_row(date: NaiveDate, i: usize, columns: &[&[Option<Decimal>]]) -> Option<Quote> {
    let cell = |field: usize| columns[field][i];

    let volume = cell(4)?;
    if volume.is_sign_negative() || !volume.fract().is_zero() {
        return None;
    }

    Some(Quote {
        date,
        open: cell(0)?,
        high: cell(1)?,
        low: cell(2)?,
        close: cell(3)?,
        volume: volume.to_u64()?,
    })
}
