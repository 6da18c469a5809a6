use crate::error::ApiError;
use chrono::{DateTime, NaiveDate};
use core_types::{Field, RawTable};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Deserialize;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// The envelope of every `GET /v8/finance/chart/{symbol}` response, success or not.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

/// Represents an error response from the chart API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

/// Descriptions the chart API uses when a symbol or range has no bars.
const NO_DATA_DESCRIPTIONS: [&str; 2] = ["No data found", "Data doesn't exist"];

impl ChartError {
    /// True when the request was well-formed but there is nothing to return:
    /// an unknown or delisted symbol, or a range without trading sessions.
    pub fn is_no_data(&self) -> bool {
        self.code.eq_ignore_ascii_case("Not Found")
            || NO_DATA_DESCRIPTIONS.iter().any(|d| self.description.starts_with(d))
    }
}

/// One instrument's series.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Absent when the requested range holds no trading days.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    /// Seconds east of UTC for the listing exchange.
    #[serde(default)]
    pub gmtoffset: i64,
    /// Decimal places the provider quotes prices to.
    pub price_hint: Option<u32>,
    // There are more fields, but these are the most important for us.
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteIndicator>,
}

/// Column-oriented OHLCV arrays. A column may be missing or contain nulls.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteIndicator {
    pub open: Option<Vec<Option<f64>>>,
    pub high: Option<Vec<Option<f64>>>,
    pub low: Option<Vec<Option<f64>>>,
    pub close: Option<Vec<Option<f64>>>,
    pub volume: Option<Vec<Option<f64>>>,
}

/// Prices are never rounded to fewer places than this.
const MIN_PRICE_DECIMALS: u32 = 2;

impl ChartResult {
    /// Converts the provider's arrays into a `RawTable`.
    ///
    /// Timestamps are shifted into the exchange's local time before taking the
    /// date, so a session that opens at 09:30 New York time lands on the right
    /// calendar day. Non-finite floats become empty cells.
    pub fn into_table(self) -> Result<RawTable, ApiError> {
        let offset = self.meta.gmtoffset;
        let dates = self
            .timestamp
            .iter()
            .map(|&ts| trading_date(ts, offset))
            .collect::<Result<Vec<NaiveDate>, ApiError>>()?;

        let decimals = self.meta.price_hint.unwrap_or(MIN_PRICE_DECIMALS).max(MIN_PRICE_DECIMALS);
        let mut table = RawTable::new(dates);

        let Some(quote) = self.indicators.quote.into_iter().next() else {
            return Ok(table);
        };

        let columns = [
            (Field::Open, quote.open, Some(decimals)),
            (Field::High, quote.high, Some(decimals)),
            (Field::Low, quote.low, Some(decimals)),
            (Field::Close, quote.close, Some(decimals)),
            (Field::Volume, quote.volume, None),
        ];
        for (field, cells, round) in columns {
            if let Some(cells) = cells {
                table.columns.insert(field, to_decimal_cells(cells, round));
            }
        }

        Ok(table)
    }
}

fn trading_date(timestamp: i64, gmtoffset: i64) -> Result<NaiveDate, ApiError> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {}", timestamp)))
}

fn to_decimal_cells(cells: Vec<Option<f64>>, round: Option<u32>) -> Vec<Option<Decimal>> {
    cells
        .into_iter()
        .map(|cell| {
            let value = cell.filter(|v| v.is_finite()).and_then(Decimal::from_f64)?;
            Some(match round {
                Some(dp) => value.round_dp(dp),
                None => value,
            })
        })
        .collect()
}
