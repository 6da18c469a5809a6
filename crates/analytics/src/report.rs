use crate::error::AnalyticsError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// One trading day of a ticker together with every metric derived for it.
///
/// Values that need history the row does not have are `None`: the first row
/// has no previous close, and the first `window - 1` rows have no moving
/// average.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
    pub previous_close: Option<Decimal>,
    pub price_change: Option<Decimal>,
    /// `Some(Err(UndefinedMetric))` when the previous close is zero.
    pub percent_change: Option<Result<Decimal, AnalyticsError>>,
    /// Highest close over the trailing high/low window (52 weeks by default).
    pub rolling_high: Decimal,
    /// Lowest close over the trailing high/low window.
    pub rolling_low: Decimal,
    /// Simple moving average of the open price.
    pub moving_average: Option<Decimal>,
}

/// Change over the whole fetched range, first close to last close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub first_close: Decimal,
    pub last_close: Decimal,
    pub change: Decimal,
    // Option<> because the first close can be zero
    pub percent_change: Option<Decimal>,
}

/// Every metric for one ticker, indexed by date.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub ticker: String,
    pub rows: Vec<MetricRow>,
    pub summary: PeriodSummary,
}

impl DerivedMetrics {
    /// Rows that have a prior day to compare against, i.e. every row but the
    /// first. Rows whose percent change is undefined are still included so the
    /// caller can report them.
    pub fn change_rows(&self) -> impl Iterator<Item = &MetricRow> {
        self.rows.iter().filter(|row| row.percent_change.is_some())
    }

    /// Rows whose percent change could not be computed, with the reason.
    pub fn undefined_changes(&self) -> impl Iterator<Item = (&MetricRow, &AnalyticsError)> {
        self.rows.iter().filter_map(|row| match &row.percent_change {
            Some(Err(e)) => Some((row, e)),
            _ => None,
        })
    }

    /// The last `n` rows, or all of them if there are fewer.
    pub fn tail(&self, n: usize) -> &[MetricRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }
}
