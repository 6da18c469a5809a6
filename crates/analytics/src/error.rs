use core_types::Field;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("No price data was returned for {ticker} in the requested range")]
    EmptyResult { ticker: String },

    #[error("Required field '{field}' is missing from the data for {ticker}")]
    MissingField { ticker: String, field: Field },

    #[error("The provider returned a single-ticker table but {requested} tickers were requested")]
    ShapeMismatch { requested: usize },

    #[error("Column '{field}' for {ticker} has {actual} values but the date index has {expected}")]
    MalformedColumn {
        ticker: String,
        field: Field,
        expected: usize,
        actual: usize,
    },

    #[error("Rolling window size must be at least 1")]
    InvalidWindow,

    #[error("{metric} is undefined at row {index}: {reason}")]
    UndefinedMetric {
        metric: &'static str,
        index: usize,
        reason: &'static str,
    },
}
