//! # Stock Analyzer Analytics
//!
//! This crate turns raw provider output into the per-ticker metrics every view
//! of the analyzer is built from.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** No I/O and no knowledge of the provider or the terminal.
//!   It depends only on `core-types`.
//! - **Explicit undefined values:** Warm-up rows and divide-by-zero rows are
//!   `None` or `Err(UndefinedMetric)`, never NaN, infinity or a silent zero.
//!
//! ## Public API
//!
//! - `normalize`: canonicalizes a `RawResponse` into a `NormalizedSeries`.
//! - `indicators`: the stateless sequence transforms (percentage change,
//!   rolling extrema, moving averages, volume axis scaling).
//! - `MetricsEngine`: assembles `DerivedMetrics` for each ticker.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod indicators;
pub mod normalizer;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsEngine;
pub use error::AnalyticsError;
pub use indicators::{Extremum, VolumeScale};
pub use normalizer::{normalize, NormalizedSeries, TickerSeries};
pub use report::{DerivedMetrics, MetricRow, PeriodSummary};
