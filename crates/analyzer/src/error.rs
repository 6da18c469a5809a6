use analytics::AnalyticsError;
use api_client::error::ApiError;
use chrono::NaiveDate;
use core_types::CoreError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error(transparent)]
    Input(#[from] CoreError),

    #[error("The start date {start} must be before the end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Fetching market data timed out after {}s", .0.as_secs_f64())]
    FetchTimeout(Duration),

    #[error("Fetching market data failed: {0}")]
    FetchFailure(#[source] ApiError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}
