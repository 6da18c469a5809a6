use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for the remote market-data provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Root URL of the chart API, without a trailing slash.
    pub base_url: String,
    /// Upper bound on a single fetch, including every ticker in the query.
    pub timeout_secs: u64,
    /// The provider rejects requests without a browser-like agent string.
    pub user_agent: String,
}

/// Window sizes and row counts used when deriving and presenting metrics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Trading days in the rolling high/low window (roughly 52 weeks).
    pub high_low_window: usize,
    /// Trading days in the simple moving average over the open price.
    pub moving_average_window: usize,
    /// Rows shown in the price preview table.
    pub preview_rows: usize,
    /// Rows shown in each key-metrics column.
    pub table_rows: usize,
    /// Trailing rows plotted in the price and volume charts.
    pub chart_window: usize,
    /// Number of intervals on the volume axis.
    pub volume_ticks: usize,
    /// Trailing rows used for the OHLC surface.
    pub surface_days: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            high_low_window: 249,
            moving_average_window: 50,
            preview_rows: 5,
            table_rows: 25,
            chart_window: 50,
            volume_ticks: 5,
            surface_days: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl Config {
    /// Rejects settings that would make the pipeline degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "provider.base_url must not be empty".to_string(),
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be greater than zero".to_string(),
            ));
        }

        let a = &self.analysis;
        let sizes = [
            ("analysis.high_low_window", a.high_low_window),
            ("analysis.moving_average_window", a.moving_average_window),
            ("analysis.preview_rows", a.preview_rows),
            ("analysis.table_rows", a.table_rows),
            ("analysis.chart_window", a.chart_window),
            ("analysis.volume_ticks", a.volume_ticks),
            ("analysis.surface_days", a.surface_days),
        ];
        for (name, value) in sizes {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }
        Ok(())
    }
}
