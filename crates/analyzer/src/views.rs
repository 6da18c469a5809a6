//! Presentation-ready view models built from an [`Analysis`].
//!
//! Each builder corresponds to one screen of the dashboard. They only select,
//! round and reshape; every number comes from `analytics`.

use crate::Analysis;
use analytics::indicators::{format_tick, tick_positions, volume_scale_bucket};
use analytics::{PeriodSummary, VolumeScale};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Decimal places shown in the metrics table.
const DISPLAY_DECIMALS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    pub ticker: String,
    pub rows: Vec<PriceRow>,
}

/// The OHLCV rows of every ticker, limited to the first `limit` rows when
/// given.
pub fn price_tables(analysis: &Analysis, limit: Option<usize>) -> Vec<PriceTable> {
    analysis
        .series
        .iter()
        .map(|series| PriceTable {
            ticker: series.ticker.clone(),
            rows: series
                .quotes
                .iter()
                .take(limit.unwrap_or(usize::MAX))
                .map(|q| PriceRow {
                    date: q.date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeRow {
    pub date: NaiveDate,
    pub close: Decimal,
    pub previous_close: Decimal,
    pub price_change: Decimal,
    /// `None` when the change is undefined; `note` then says why.
    pub percent_change: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsTable {
    pub ticker: String,
    pub rows: Vec<ChangeRow>,
    pub summary: PeriodSummary,
}

/// Close, previous close, change and percent change for every day that has a
/// prior day, rounded for display.
pub fn metrics_tables(analysis: &Analysis) -> Vec<MetricsTable> {
    analysis
        .metrics
        .iter()
        .map(|metrics| {
            let rows = metrics
                .change_rows()
                .filter_map(|row| {
                    let previous_close = row.previous_close?;
                    let price_change = row.price_change?;
                    let (percent_change, note) = match row.percent_change.as_ref()? {
                        Ok(value) => (Some(value.round_dp(DISPLAY_DECIMALS)), None),
                        Err(e) => (None, Some(e.to_string())),
                    };
                    Some(ChangeRow {
                        date: row.date,
                        close: row.close.round_dp(DISPLAY_DECIMALS),
                        previous_close: previous_close.round_dp(DISPLAY_DECIMALS),
                        price_change: price_change.round_dp(DISPLAY_DECIMALS),
                        percent_change,
                        note,
                    })
                })
                .collect();

            MetricsTable {
                ticker: metrics.ticker.clone(),
                rows,
                summary: metrics.summary.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatedValue {
    pub date: NaiveDate,
    pub value: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DatedValue {
    fn defined(date: NaiveDate, value: Decimal) -> Self {
        Self {
            date,
            value: Some(value),
            note: None,
        }
    }
}

/// Four independent columns shown side by side. The percent-change column
/// starts one day later than the others because the first day has no change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub ticker: String,
    pub price: Vec<DatedValue>,
    pub percent_change: Vec<DatedValue>,
    pub high_52_week: Vec<DatedValue>,
    pub low_52_week: Vec<DatedValue>,
}

/// The first `rows` entries of price, percent change, 52-week high and 52-week
/// low for every ticker.
pub fn key_metrics(analysis: &Analysis, rows: usize) -> Vec<KeyMetrics> {
    analysis
        .metrics
        .iter()
        .map(|metrics| {
            let head = metrics.rows.iter().take(rows);
            KeyMetrics {
                ticker: metrics.ticker.clone(),
                price: head.clone().map(|r| DatedValue::defined(r.date, r.close)).collect(),
                percent_change: metrics
                    .change_rows()
                    .take(rows)
                    .map(|r| match &r.percent_change {
                        Some(Ok(value)) => DatedValue::defined(r.date, *value),
                        Some(Err(e)) => DatedValue {
                            date: r.date,
                            value: None,
                            note: Some(e.to_string()),
                        },
                        None => DatedValue {
                            date: r.date,
                            value: None,
                            note: None,
                        },
                    })
                    .collect(),
                high_52_week: head
                    .clone()
                    .map(|r| DatedValue::defined(r.date, r.rolling_high))
                    .collect(),
                low_52_week: head.map(|r| DatedValue::defined(r.date, r.rolling_low)).collect(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: Decimal,
    pub close: Decimal,
    pub moving_average: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChart {
    pub ticker: String,
    pub moving_average_window: usize,
    pub points: Vec<PricePoint>,
}

/// Open, close and moving average over the last `window` days. The average
/// is computed over the full fetched history first, so the plotted tail has
/// values wherever enough history exists.
pub fn price_charts(analysis: &Analysis, window: usize, moving_average_window: usize) -> Vec<PriceChart> {
    analysis
        .metrics
        .iter()
        .map(|metrics| PriceChart {
            ticker: metrics.ticker.clone(),
            moving_average_window,
            points: metrics
                .tail(window)
                .iter()
                .map(|r| PricePoint {
                    date: r.date,
                    open: r.open,
                    close: r.close,
                    moving_average: r.moving_average,
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeBar {
    pub date: NaiveDate,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeSeries {
    pub ticker: String,
    pub bars: Vec<VolumeBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTick {
    pub value: u64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeChart {
    pub series: Vec<VolumeSeries>,
    pub max_volume: u64,
    pub scale: VolumeScale,
    pub ticks: Vec<AxisTick>,
}

/// Volume bars for the last `window` days of every ticker, on one shared axis.
///
/// The axis maximum is taken over exactly the bars being plotted.
pub fn volume_chart(analysis: &Analysis, window: usize, tick_count: usize) -> VolumeChart {
    let series: Vec<VolumeSeries> = analysis
        .series
        .iter()
        .map(|s| VolumeSeries {
            ticker: s.ticker.clone(),
            bars: s
                .tail(window)
                .iter()
                .map(|q| VolumeBar {
                    date: q.date,
                    volume: q.volume,
                })
                .collect(),
        })
        .collect();

    let max_volume = series
        .iter()
        .flat_map(|s| s.bars.iter().map(|b| b.volume))
        .max()
        .unwrap_or(0);
    let scale = volume_scale_bucket(max_volume);
    let ticks = tick_positions(max_volume, tick_count)
        .into_iter()
        .map(|value| AxisTick {
            value,
            label: format_tick(value, scale),
        })
        .collect();

    VolumeChart {
        series,
        max_volume,
        scale,
        ticks,
    }
}

/// Labels for the rows of [`OhlcSurface::z`].
pub const SURFACE_ROWS: [&str; 4] = ["Open", "High", "Low", "Close"];

/// A 4 × N price matrix (open, high, low, close by day) for a 3D surface plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcSurface {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub rows: [&'static str; 4],
    pub z: Vec<Vec<Decimal>>,
}

/// The OHLC surface of the first requested ticker over its last `days` rows.
pub fn ohlc_surface(analysis: &Analysis, days: usize) -> Option<OhlcSurface> {
    let series = analysis.series.first()?;
    let quotes = series.tail(days);

    let z = vec![
        quotes.iter().map(|q| q.open).collect(),
        quotes.iter().map(|q| q.high).collect(),
        quotes.iter().map(|q| q.low).collect(),
        quotes.iter().map(|q| q.close).collect(),
    ];

    Some(OhlcSurface {
        ticker: series.ticker.clone(),
        dates: quotes.iter().map(|q| q.date).collect(),
        rows: SURFACE_ROWS,
        z,
    })
}
