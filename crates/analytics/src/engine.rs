use crate::error::AnalyticsError;
use crate::indicators::{
    align_trailing, moving_average, percentage_change, price_change, rolling_extremum, Extremum,
};
use crate::normalizer::{NormalizedSeries, TickerSeries};
use crate::report::{DerivedMetrics, MetricRow, PeriodSummary};
use rust_decimal::Decimal;

/// Trading days in the rolling 52-week high/low window.
pub const DEFAULT_HIGH_LOW_WINDOW: usize = 249;
/// Trading days in the open-price moving average.
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 50;

/// A stateless calculator for deriving per-ticker metrics from a normalized series.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    high_low_window: usize,
    moving_average_window: usize,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self {
            high_low_window: DEFAULT_HIGH_LOW_WINDOW,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
        }
    }
}

impl MetricsEngine {
    /// Creates an engine with custom window sizes. Both must be at least 1.
    pub fn new(high_low_window: usize, moving_average_window: usize) -> Result<Self, AnalyticsError> {
        if high_low_window == 0 || moving_average_window == 0 {
            return Err(AnalyticsError::InvalidWindow);
        }
        Ok(Self {
            high_low_window,
            moving_average_window,
        })
    }

    /// Derives metrics for every ticker, stopping at the first failure.
    pub fn calculate_all(&self, normalized: &NormalizedSeries) -> Result<Vec<DerivedMetrics>, AnalyticsError> {
        normalized.iter().map(|series| self.calculate(series)).collect()
    }

    /// The main entry point for calculating one ticker's metrics.
    ///
    /// # Arguments
    ///
    /// * `series` - A normalized, date-ascending series with at least one row.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `DerivedMetrics` or an `AnalyticsError`.
    pub fn calculate(&self, series: &TickerSeries) -> Result<DerivedMetrics, AnalyticsError> {
        let summary = self.period_summary(series)?;

        let closes = series.closes();
        let opens = series.opens();
        let len = closes.len();

        let changes = price_change(&closes);
        let mut percent_changes = percentage_change(&closes).into_iter();
        let highs = rolling_extremum(&closes, self.high_low_window, Extremum::Max)?;
        let lows = rolling_extremum(&closes, self.high_low_window, Extremum::Min)?;
        let averages = align_trailing(moving_average(&opens, self.moving_average_window)?, len);

        let mut rows = Vec::with_capacity(len);
        for (i, (quote, moving_average)) in series.quotes.iter().zip(averages).enumerate() {
            let prior = i.checked_sub(1);
            let percent_change = prior.and_then(|_| percent_changes.next());

            if let Some(Err(e)) = &percent_change {
                tracing::warn!(ticker = %series.ticker, date = %quote.date, error = %e, "Undefined metric");
            }

            rows.push(MetricRow {
                date: quote.date,
                open: quote.open,
                high: quote.high,
                low: quote.low,
                close: quote.close,
                volume: quote.volume,
                previous_close: prior.map(|j| closes[j]),
                price_change: prior.map(|j| changes[j]),
                percent_change,
                rolling_high: highs[i],
                rolling_low: lows[i],
                moving_average,
            });
        }

        tracing::debug!(ticker = %series.ticker, rows = rows.len(), "Derived metrics");
        Ok(DerivedMetrics {
            ticker: series.ticker.clone(),
            rows,
            summary,
        })
    }

    /// First-to-last close change over the whole series.
    ///
    /// `percent_change` is `None` when the first close is zero.
    pub fn period_summary(&self, series: &TickerSeries) -> Result<PeriodSummary, AnalyticsError> {
        let (Some(first), Some(last)) = (series.quotes.first(), series.quotes.last()) else {
            return Err(AnalyticsError::EmptyResult {
                ticker: series.ticker.clone(),
            });
        };

        let change = last.close - first.close;
        let percent_change = change
            .checked_div(first.close)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));

        Ok(PeriodSummary {
            start_date: first.date,
            end_date: last.date,
            first_close: first.close,
            last_close: last.close,
            change,
            percent_change,
        })
    }
}
