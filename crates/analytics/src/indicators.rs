//! Stateless transforms over date-ordered sequences.
//!
//! Every function takes its input as a plain slice and returns a new sequence;
//! none of them keep state between calls.

use crate::error::AnalyticsError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Default number of intervals on a volume axis.
pub const DEFAULT_TICK_COUNT: usize = 5;

/// Which extreme a rolling window reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Max,
    Min,
}

impl Extremum {
    /// True if `held` should stay ahead of `incoming` in the window.
    fn keeps(&self, held: Decimal, incoming: Decimal) -> bool {
        match self {
            Extremum::Max => held > incoming,
            Extremum::Min => held < incoming,
        }
    }
}

/// Day-over-day absolute change. Output has `len - 1` elements; element `i`
/// is `series[i + 1] - series[i]`.
pub fn price_change(series: &[Decimal]) -> Vec<Decimal> {
    series.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Day-over-day percentage change. Output has `len - 1` elements; element `i`
/// is `(series[i + 1] - series[i]) / series[i] * 100`.
///
/// The first index has no prior value and is omitted. A zero prior value makes
/// that element `Err(UndefinedMetric)` while the rest are still computed.
pub fn percentage_change(series: &[Decimal]) -> Vec<Result<Decimal, AnalyticsError>> {
    series
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            let (previous, current) = (w[0], w[1]);
            if previous.is_zero() {
                return Err(undefined_change(i + 1, "previous value is zero"));
            }
            (current - previous)
                .checked_div(previous)
                .and_then(|ratio| ratio.checked_mul(ONE_HUNDRED))
                .ok_or_else(|| undefined_change(i + 1, "result is out of range"))
        })
        .collect()
}

fn undefined_change(index: usize, reason: &'static str) -> AnalyticsError {
    AnalyticsError::UndefinedMetric {
        metric: "percent change",
        index,
        reason,
    }
}

/// The max or min over the trailing `window` points ending at each index.
///
/// The first `window - 1` outputs use every point seen so far, so the output
/// is always the same length as the input.
pub fn rolling_extremum(
    series: &[Decimal],
    window: usize,
    kind: Extremum,
) -> Result<Vec<Decimal>, AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::InvalidWindow);
    }

    // Indices whose values are monotonic from front to back; the front is the
    // current extreme.
    let mut candidates: VecDeque<usize> = VecDeque::with_capacity(window.min(series.len()));
    let mut output = Vec::with_capacity(series.len());

    for (i, &value) in series.iter().enumerate() {
        while let Some(&back) = candidates.back() {
            if kind.keeps(series[back], value) {
                break;
            }
            candidates.pop_back();
        }
        candidates.push_back(i);

        while let Some(&front) = candidates.front() {
            if front + window > i {
                break;
            }
            candidates.pop_front();
        }

        output.push(series[candidates[0]]);
    }

    Ok(output)
}

/// Simple moving average over full windows only.
///
/// Output has `max(0, len - window + 1)` elements; element `i` is the mean of
/// `series[i..i + window]`. Use [`align_trailing`] to line it back up with the
/// source index.
pub fn moving_average(series: &[Decimal], window: usize) -> Result<Vec<Decimal>, AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::InvalidWindow);
    }
    if series.len() < window {
        return Ok(Vec::new());
    }

    let divisor = Decimal::from(window);
    let mut sum: Decimal = series[..window].iter().sum();
    let mut output = Vec::with_capacity(series.len() - window + 1);
    output.push(sum / divisor);

    for i in window..series.len() {
        sum += series[i] - series[i - window];
        output.push(sum / divisor);
    }

    Ok(output)
}

/// Left-pads a sequence computed over trailing windows with `None` so that it
/// has `len` elements aligned to the source index.
pub fn align_trailing<T>(values: Vec<T>, len: usize) -> Vec<Option<T>> {
    let padding = len.saturating_sub(values.len());
    std::iter::repeat_with(|| None)
        .take(padding)
        .chain(values.into_iter().map(Some))
        .collect()
}

/// A volume axis unit, e.g. millions with the suffix `"M"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VolumeScale {
    pub factor: u64,
    pub suffix: &'static str,
}

/// Picks the axis unit for a chart whose largest bar is `max_volume`.
pub fn volume_scale_bucket(max_volume: u64) -> VolumeScale {
    let (factor, suffix) = match max_volume {
        v if v >= 1_000_000_000 => (1_000_000_000, "B"),
        v if v >= 1_000_000 => (1_000_000, "M"),
        v if v >= 1_000 => (1_000, "K"),
        _ => (1, ""),
    };
    VolumeScale { factor, suffix }
}

/// Evenly spaced axis ticks from 0 up to `max_volume`, stepped by
/// `floor(max_volume / count)`, at most `count + 1` of them.
///
/// A zero maximum (or zero count) yields the single tick `[0]`. When
/// `max_volume < count` the step is clamped to 1.
pub fn tick_positions(max_volume: u64, count: usize) -> Vec<u64> {
    if max_volume == 0 || count == 0 {
        return vec![0];
    }
    let step = (max_volume / count as u64).max(1);
    let step = usize::try_from(step).unwrap_or(usize::MAX);
    (0..=max_volume).step_by(step).take(count + 1).collect()
}

/// Renders a tick value in the given unit, truncating toward zero.
pub fn format_tick(value: u64, scale: VolumeScale) -> String {
    format!("{}{}", value / scale.factor, scale.suffix)
}
