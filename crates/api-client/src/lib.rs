use crate::error::ApiError;
use crate::responses::ChartResponse;
use async_trait::async_trait;
use chrono::NaiveDate;
use configuration::ProviderConfig;
use core_types::{RawResponse, RawTable, TickerSet};
use futures::future::join_all;
use reqwest::StatusCode;

pub mod cache;
pub mod error;
pub mod responses;
// --- Public API ---
pub use cache::{CacheKey, FetchCache};
pub use responses::{ChartError, ChartMeta, ChartResult};

/// The generic, abstract interface for a historical market-data provider.
/// This trait is the contract the analyzer uses, allowing the underlying
/// implementation (live or stubbed) to be swapped out.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetches daily OHLCV data for every ticker in `tickers` over
    /// `[start, end)`.
    ///
    /// A single ticker comes back as `RawResponse::Flat`, several as
    /// `RawResponse::MultiTicker`. Any per-ticker failure fails the whole call.
    async fn fetch(
        &self,
        tickers: &TickerSet,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawResponse, ApiError>;
}

/// A concrete implementation of `MarketDataSource` for the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetches one symbol's daily bars. The provider may return bars outside
    /// the requested range; callers trim them.
    async fn fetch_symbol(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawTable, ApiError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        let period2 = end.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        let (Some(period1), Some(period2)) = (period1, period2) else {
            return Err(ApiError::InvalidData(format!(
                "Unrepresentable date range {} to {}",
                start, end
            )));
        };

        tracing::debug!(symbol, %start, %end, "Requesting daily chart");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        let table = decode_chart(symbol, status, &text)?;
        tracing::debug!(symbol, rows = table.len(), "Received daily chart");
        Ok(table)
    }
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn fetch(
        &self,
        tickers: &TickerSet,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawResponse, ApiError> {
        let requests = tickers.iter().map(|symbol| async move {
            let table = self.fetch_symbol(symbol, start, end).await?;
            Ok::<_, ApiError>((symbol.to_string(), table))
        });

        let tables = join_all(requests)
            .await
            .into_iter()
            .collect::<Result<Vec<(String, RawTable)>, ApiError>>()?;

        Ok(assemble_response(tables, start, end))
    }
}

/// Trims every table to `[start, end)` and picks the response shape: `Flat`
/// for a single ticker, `MultiTicker` keyed by symbol otherwise.
fn assemble_response(tables: Vec<(String, RawTable)>, start: NaiveDate, end: NaiveDate) -> RawResponse {
    let trimmed: Vec<(String, RawTable)> = tables
        .into_iter()
        .map(|(symbol, mut table)| {
            table.retain_dates(|d| *d >= start && *d < end);
            (symbol, table)
        })
        .collect();

    match <[(String, RawTable); 1]>::try_from(trimmed) {
        Ok([(_, table)]) => RawResponse::Flat(table),
        Err(tables) => RawResponse::MultiTicker(tables.into_iter().collect()),
    }
}

/// Turns a raw chart response body into a table, mapping every failure shape
/// the provider uses onto `ApiError`.
fn decode_chart(symbol: &str, status: StatusCode, body: &str) -> Result<RawTable, ApiError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited);
    }

    let parsed = serde_json::from_str::<ChartResponse>(body);
    let chart = match (parsed, status.is_success()) {
        (Ok(response), _) => response.chart,
        (Err(_), false) => {
            return Err(ApiError::Provider {
                symbol: symbol.to_string(),
                message: format!("HTTP {}", status),
            });
        }
        (Err(e), true) => {
            return Err(ApiError::Deserialization(format!(
                "{}. Original text: {}",
                e, body
            )));
        }
    };

    if let Some(error) = chart.error {
        // Unknown symbols and ranges without sessions are empty results, not failures.
        if error.is_no_data() {
            tracing::debug!(symbol, code = %error.code, description = %error.description, "No data for request");
            return Ok(RawTable::default());
        }
        return Err(ApiError::Provider {
            symbol: symbol.to_string(),
            message: format!("{}: {}", error.code, error.description),
        });
    }

    let result = chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ApiError::Provider {
            symbol: symbol.to_string(),
            message: "response contained no result".to_string(),
        })?;

    result.into_table()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_status_maps_to_rate_limited() {
        let err = decode_chart("AAPL", StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));
    }

    #[test]
    fn provider_error_payload_is_surfaced() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Internal Server Error","description":"Service unavailable"}}}"#;
        let err = decode_chart("AAPL", StatusCode::INTERNAL_SERVER_ERROR, body).unwrap_err();
        match err {
            ApiError::Provider { symbol, message } => {
                assert_eq!(symbol, "AAPL");
                assert!(message.contains("Service unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_symbol_decodes_to_an_empty_table() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let table = decode_chart("NOPE", StatusCode::NOT_FOUND, body).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn range_without_sessions_decodes_to_an_empty_table() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Data doesn't exist for startDate = 1673049600, endDate = 1673136000"}}}"#;
        let table = decode_chart("AAPL", StatusCode::BAD_REQUEST, body).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn non_json_failure_reports_status() {
        let err = decode_chart("AAPL", StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn garbage_success_body_is_a_deserialization_error() {
        let err = decode_chart("AAPL", StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn successful_body_becomes_a_table() {
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL", "gmtoffset": -18000, "priceHint": 2},
                    "timestamp": [1672756200],
                    "indicators": {"quote": [{
                        "open": [130.28], "high": [130.9], "low": [124.17],
                        "close": [125.07], "volume": [112117500]
                    }]}
                }],
                "error": null
            }
        }"#;
        let table = decode_chart("AAPL", StatusCode::OK, body).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns.len(), 5);
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    fn table(days: &[u32]) -> RawTable {
        let cells = days.iter().map(|&d| Some(rust_decimal::Decimal::from(d))).collect();
        RawTable::new(days.iter().map(|&d| day(d)).collect()).with_column(core_types::Field::Close, cells)
    }

    #[test]
    fn single_ticker_is_flat_and_trimmed_to_the_range() {
        let response = assemble_response(vec![("AAPL".to_string(), table(&[2, 3, 4, 9, 10]))], day(3), day(10));
        let RawResponse::Flat(table) = response else {
            panic!("expected a flat response");
        };
        assert_eq!(table.dates, vec![day(3), day(4), day(9)]);
        assert_eq!(table.column(core_types::Field::Close).unwrap().len(), 3);
    }

    #[test]
    fn several_tickers_are_keyed_by_symbol() {
        let response = assemble_response(
            vec![
                ("MSFT".to_string(), table(&[3, 4, 10])),
                ("AAPL".to_string(), table(&[3])),
            ],
            day(3),
            day(10),
        );
        let RawResponse::MultiTicker(tables) = response else {
            panic!("expected a multi-ticker response");
        };
        assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
        assert_eq!(tables["MSFT"].dates, vec![day(3), day(4)]);
        assert_eq!(tables["AAPL"].len(), 1);
    }

    #[test]
    fn range_outside_the_bars_leaves_empty_tables() {
        let response = assemble_response(vec![("AAPL".to_string(), table(&[2, 3]))], day(7), day(8));
        assert_eq!(response.row_count(), 0);
    }
}
