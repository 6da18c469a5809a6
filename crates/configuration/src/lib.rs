use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{AnalysisConfig, Config, LoggingConfig, ProviderConfig};

/// The default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix for environment variable overrides, e.g.
/// `STOCK_ANALYZER_PROVIDER__TIMEOUT_SECS=10`.
pub const ENV_PREFIX: &str = "STOCK_ANALYZER";

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Loads the application configuration.
///
/// Sources are layered: built-in defaults, then the TOML file (the explicit
/// `path` if given, which must exist, otherwise an optional `config.toml`),
/// then `STOCK_ANALYZER_*` environment variables. The merged result is
/// validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

/// Parses configuration from an in-memory TOML document. Defaults fill any
/// missing keys.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = load_config_from_str(
            r#"
            [provider]
            timeout_secs = 5

            [analysis]
            table_rows = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.timeout_secs, 5);
        assert_eq!(config.provider.base_url, "https://query1.finance.yahoo.com");
        assert_eq!(config.analysis.table_rows, 10);
        assert_eq!(config.analysis.high_low_window, 249);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = load_config_from_str("[analysis]\nchart_window = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("does-not-exist.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
