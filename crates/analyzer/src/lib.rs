use crate::error::AnalyzerError;
use analytics::{normalize, DerivedMetrics, MetricsEngine, NormalizedSeries};
use api_client::{CacheKey, FetchCache, MarketDataSource};
use chrono::{Days, NaiveDate};
use configuration::AnalysisConfig;
use core_types::{RawResponse, TickerSet};
use std::sync::Arc;
use std::time::Duration;

pub mod error;
pub mod views;

/// Calendar days covered by the default date range.
pub const DEFAULT_LOOKBACK_DAYS: u64 = 365;

/// What the user asked for: which tickers, over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisQuery {
    pub tickers: TickerSet,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnalysisQuery {
    pub fn new(tickers: TickerSet, start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyzerError> {
        if start >= end {
            return Err(AnalyzerError::InvalidDateRange { start, end });
        }
        Ok(Self { tickers, start, end })
    }

    /// Builds a query from free-text ticker input such as `"aapl, msft"`.
    pub fn parse(input: &str, start: NaiveDate, end: NaiveDate) -> Result<Self, AnalyzerError> {
        Self::new(TickerSet::parse(input)?, start, end)
    }

    /// The default range: the year up to `today`.
    pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }
}

/// The result of one analysis run: cleaned series plus derived metrics for
/// every ticker, in input order.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub query: AnalysisQuery,
    pub series: NormalizedSeries,
    pub metrics: Vec<DerivedMetrics>,
}

/// The fetch → normalize → derive pipeline.
///
/// Each analyzer owns its cache handle; give every user session its own
/// `FetchCache` so cached responses are never shared between sessions.
pub struct StockAnalyzer {
    source: Arc<dyn MarketDataSource>,
    cache: FetchCache,
    engine: MetricsEngine,
    settings: AnalysisConfig,
    fetch_timeout: Duration,
}

impl StockAnalyzer {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        cache: FetchCache,
        settings: AnalysisConfig,
        fetch_timeout: Duration,
    ) -> Result<Self, AnalyzerError> {
        let engine = MetricsEngine::new(settings.high_low_window, settings.moving_average_window)?;
        Ok(Self {
            source,
            cache,
            engine,
            settings,
            fetch_timeout,
        })
    }

    pub fn settings(&self) -> &AnalysisConfig {
        &self.settings
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    /// Returns the provider response for `query`, from the cache when possible.
    ///
    /// Only successful fetches are cached, so a failed query is retried on the
    /// next call.
    pub async fn fetch(&self, query: &AnalysisQuery) -> Result<Arc<RawResponse>, AnalyzerError> {
        let key = CacheKey::new(&query.tickers, query.start, query.end);
        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(tickers = %query.tickers, "Serving market data from cache");
            return Ok(cached);
        }

        tracing::info!(
            tickers = %query.tickers,
            start = %query.start,
            end = %query.end,
            "Fetching market data"
        );

        let fetch = self.source.fetch(&query.tickers, query.start, query.end);
        let response = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Err(_elapsed) => return Err(AnalyzerError::FetchTimeout(self.fetch_timeout)),
            Ok(Err(e)) if e.is_timeout() => return Err(AnalyzerError::FetchTimeout(self.fetch_timeout)),
            Ok(Err(e)) => return Err(AnalyzerError::FetchFailure(e)),
            Ok(Ok(response)) => response,
        };

        tracing::info!(rows = response.row_count(), "Market data fetched");
        Ok(self.cache.insert(key, response))
    }

    /// Runs the whole pipeline for one query.
    pub async fn analyze(&self, query: &AnalysisQuery) -> Result<Analysis, AnalyzerError> {
        let raw = self.fetch(query).await?;
        let series = normalize(&raw, &query.tickers)?;
        let metrics = self.engine.calculate_all(&series)?;

        tracing::info!(tickers = series.len(), "Analysis complete");
        Ok(Analysis {
            query: query.clone(),
            series,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn query_requires_start_before_end() {
        let err = AnalysisQuery::parse("AAPL", date(2023, 1, 10), date(2023, 1, 3)).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidDateRange { .. }));

        let err = AnalysisQuery::parse("AAPL", date(2023, 1, 3), date(2023, 1, 3)).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidDateRange { .. }));
    }

    #[test]
    fn query_requires_a_ticker() {
        let err = AnalysisQuery::parse(" , ", date(2023, 1, 3), date(2023, 1, 10)).unwrap_err();
        assert!(matches!(err, AnalyzerError::Input(core_types::CoreError::EmptyInput)));
    }

    #[test]
    fn default_range_is_one_year() {
        let (start, end) = AnalysisQuery::default_range(date(2024, 3, 1));
        assert_eq!(start, date(2023, 3, 2));
        assert_eq!(end, date(2024, 3, 1));
    }
}
