use analytics::AnalyticsError;
use analyzer::error::AnalyzerError;
use analyzer::{views, AnalysisQuery, StockAnalyzer};
use api_client::error::ApiError;
use api_client::{FetchCache, MarketDataSource};
use async_trait::async_trait;
use chrono::NaiveDate;
use configuration::AnalysisConfig;
use core_types::{Field, RawResponse, RawTable, TickerSet};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An in-memory provider that serves fixed tables and counts calls.
struct StubSource {
    tables: BTreeMap<String, RawTable>,
    delay: Option<Duration>,
    fail: bool,
    client_error: Mutex<Option<reqwest::Error>>,
    calls: AtomicUsize,
}

impl StubSource {
    fn new(tables: BTreeMap<String, RawTable>) -> Self {
        Self {
            tables,
            delay: None,
            fail: false,
            client_error: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for StubSource {
    async fn fetch(
        &self,
        tickers: &TickerSet,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let client_error = self.client_error.lock().unwrap().take();
        if let Some(e) = client_error {
            return Err(ApiError::Http(e));
        }
        if self.fail {
            return Err(ApiError::Provider {
                symbol: tickers.first().to_string(),
                message: "Internal Server Error: Service unavailable".to_string(),
            });
        }

        let mut selected = BTreeMap::new();
        for symbol in tickers.iter() {
            let mut table = self.tables.get(symbol).cloned().unwrap_or_default();
            table.retain_dates(|d| *d >= start && *d < end);
            selected.insert(symbol.to_string(), table);
        }

        if tickers.len() == 1 {
            let table = selected.into_values().next().unwrap_or_default();
            return Ok(RawResponse::Flat(table));
        }
        Ok(RawResponse::MultiTicker(selected))
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// AAPL's first five sessions of 2023 with round-number closes.
fn aapl_table() -> RawTable {
    let dates = vec![
        date(2023, 1, 3),
        date(2023, 1, 4),
        date(2023, 1, 5),
        date(2023, 1, 6),
        date(2023, 1, 9),
    ];
    let closes = [dec!(130), dec!(132), dec!(128), dec!(131), dec!(135)];
    let cells: Vec<Option<Decimal>> = closes.iter().copied().map(Some).collect();
    RawTable::new(dates)
        .with_column(Field::Open, cells.clone())
        .with_column(Field::High, cells.clone())
        .with_column(Field::Low, cells.clone())
        .with_column(Field::Close, cells)
        .with_column(
            Field::Volume,
            vec![
                Some(dec!(112117500)),
                Some(dec!(89113600)),
                Some(dec!(80962700)),
                Some(dec!(87754700)),
                Some(dec!(70790800)),
            ],
        )
}

fn tables() -> BTreeMap<String, RawTable> {
    let mut tables = BTreeMap::new();
    tables.insert("AAPL".to_string(), aapl_table());
    tables.insert("MSFT".to_string(), aapl_table());
    tables
}

fn analyzer(source: Arc<StubSource>, timeout: Duration) -> StockAnalyzer {
    StockAnalyzer::new(source, FetchCache::new(), AnalysisConfig::default(), timeout).unwrap()
}

fn january_query(tickers: &str) -> AnalysisQuery {
    AnalysisQuery::parse(tickers, date(2023, 1, 3), date(2023, 1, 10)).unwrap()
}

#[tokio::test]
async fn end_to_end_single_ticker() {
    let source = Arc::new(StubSource::new(tables()));
    let analyzer = analyzer(source.clone(), Duration::from_secs(5));

    let analysis = analyzer.analyze(&january_query("aapl")).await.unwrap();
    let metrics = &analysis.metrics[0];
    assert_eq!(metrics.ticker, "AAPL");

    let percent: Vec<Decimal> = metrics
        .change_rows()
        .map(|r| r.percent_change.clone().unwrap().unwrap().round_dp(3))
        .collect();
    assert_eq!(percent, vec![dec!(1.538), dec!(-3.030), dec!(2.344), dec!(3.053)]);

    let highs: Vec<Decimal> = metrics.rows.iter().map(|r| r.rolling_high).collect();
    assert_eq!(highs, vec![dec!(130), dec!(132), dec!(132), dec!(132), dec!(135)]);

    // Five rows are not enough history for the 50-day average.
    assert!(metrics.rows.iter().all(|r| r.moving_average.is_none()));
}

#[tokio::test]
async fn repeated_queries_hit_the_cache() {
    let source = Arc::new(StubSource::new(tables()));
    let analyzer = analyzer(source.clone(), Duration::from_secs(5));

    analyzer.analyze(&january_query("AAPL, MSFT")).await.unwrap();
    analyzer.analyze(&january_query("msft,aapl")).await.unwrap();
    assert_eq!(source.calls(), 1);
    assert_eq!(analyzer.cache().len(), 1);

    let other_range = AnalysisQuery::parse("AAPL,MSFT", date(2023, 1, 4), date(2023, 1, 10)).unwrap();
    analyzer.analyze(&other_range).await.unwrap();
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn separate_caches_do_not_share_entries() {
    let source = Arc::new(StubSource::new(tables()));
    let first = analyzer(source.clone(), Duration::from_secs(5));
    let second = analyzer(source.clone(), Duration::from_secs(5));

    first.analyze(&january_query("AAPL")).await.unwrap();
    second.analyze(&january_query("AAPL")).await.unwrap();
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn weekend_range_is_an_empty_result() {
    let source = Arc::new(StubSource::new(tables()));
    let analyzer = analyzer(source, Duration::from_secs(5));

    // Saturday only, since the end date is exclusive.
    let query = AnalysisQuery::parse("AAPL", date(2023, 1, 7), date(2023, 1, 8)).unwrap();
    let err = analyzer.analyze(&query).await.unwrap_err();
    assert!(matches!(
        err,
        AnalyzerError::Analytics(AnalyticsError::EmptyResult { ref ticker }) if ticker == "AAPL"
    ));
}

#[tokio::test]
async fn unknown_ticker_in_a_group_is_an_empty_result() {
    let source = Arc::new(StubSource::new(tables()));
    let analyzer = analyzer(source, Duration::from_secs(5));

    let err = analyzer.analyze(&january_query("AAPL,NOPE")).await.unwrap_err();
    assert!(matches!(
        err,
        AnalyzerError::Analytics(AnalyticsError::EmptyResult { ref ticker }) if ticker == "NOPE"
    ));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let mut stub = StubSource::new(tables());
    stub.delay = Some(Duration::from_secs(5));
    let source = Arc::new(stub);
    let analyzer = analyzer(source.clone(), Duration::from_millis(50));

    let err = analyzer.analyze(&january_query("AAPL")).await.unwrap_err();
    assert!(matches!(err, AnalyzerError::FetchTimeout(d) if d == Duration::from_millis(50)));
    assert!(analyzer.cache().is_empty());
}

/// A genuine reqwest timeout, from a listener that accepts but never answers.
async fn client_timeout() -> reqwest::Error {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let err = client.get(format!("http://{addr}/")).send().await.unwrap_err();
    drop(listener);
    err
}

#[tokio::test]
async fn client_timeout_is_a_fetch_timeout() {
    let stub = StubSource::new(tables());
    *stub.client_error.lock().unwrap() = Some(client_timeout().await);
    let source = Arc::new(stub);
    let analyzer = analyzer(source.clone(), Duration::from_secs(5));

    let err = analyzer.analyze(&january_query("AAPL")).await.unwrap_err();
    assert!(matches!(err, AnalyzerError::FetchTimeout(d) if d == Duration::from_secs(5)));
    assert!(analyzer.cache().is_empty());

    // The next attempt goes back to the provider and succeeds.
    analyzer.analyze(&january_query("AAPL")).await.unwrap();
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn provider_failures_are_not_cached() {
    let mut stub = StubSource::new(tables());
    stub.fail = true;
    let source = Arc::new(stub);
    let analyzer = analyzer(source.clone(), Duration::from_secs(5));

    for _ in 0..2 {
        let err = analyzer.analyze(&january_query("NOPE")).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::FetchFailure(ApiError::Provider { .. })));
    }
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn views_render_from_one_analysis() {
    let source = Arc::new(StubSource::new(tables()));
    let analyzer = analyzer(source, Duration::from_secs(5));
    let analysis = analyzer.analyze(&january_query("MSFT,AAPL")).await.unwrap();
    let settings = analyzer.settings();

    let surface = views::ohlc_surface(&analysis, settings.surface_days).unwrap();
    assert_eq!(surface.ticker, "MSFT");

    let chart = views::volume_chart(&analysis, settings.chart_window, settings.volume_ticks);
    assert_eq!(chart.max_volume, 112_117_500);
    assert_eq!(chart.scale.suffix, "M");
    assert_eq!(chart.ticks.len(), 6);

    let json = serde_json::to_value(views::metrics_tables(&analysis)).unwrap();
    assert_eq!(json[0]["ticker"], "MSFT");
    assert_eq!(json[1]["rows"].as_array().unwrap().len(), 4);
}
