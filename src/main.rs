use analyzer::error::AnalyzerError;
use analyzer::{views, Analysis, AnalysisQuery, StockAnalyzer};
use api_client::{FetchCache, YahooClient};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use configuration::{init_tracing, load_config, Config, OutputFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod render;

/// The main entry point for the stock analyzer.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; it only supplies optional overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_tracing(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initialising logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Execute the appropriate command
    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Historical stock analysis: prices, daily returns, 52-week ranges,
/// moving averages and volume.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./config.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the downloaded price data.
    Prices(PricesArgs),
    /// Show close, previous close, change and % change per day.
    Metrics(QueryArgs),
    /// Show price, % change, 52-week high and 52-week low side by side.
    KeyMetrics(QueryArgs),
    /// Show the price / moving-average and volume chart data.
    Charts(QueryArgs),
    /// Show the OHLC surface of the first ticker.
    Summary(QueryArgs),
}

#[derive(Args)]
struct QueryArgs {
    /// Comma-separated ticker symbols (e.g., "AAPL, MSFT").
    #[arg(long, short)]
    tickers: String,

    /// The first date to include (format: YYYY-MM-DD). Defaults to one year ago.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// The date to stop before (format: YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Args)]
struct PricesArgs {
    #[command(flatten)]
    query: QueryArgs,

    /// Print every row instead of a preview.
    #[arg(long)]
    all: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    let client = YahooClient::new(&config.provider)?;
    let analyzer = StockAnalyzer::new(
        Arc::new(client),
        FetchCache::new(),
        config.analysis.clone(),
        config.provider.timeout(),
    )?;
    let settings = analyzer.settings();

    match command {
        Commands::Prices(args) => {
            let analysis = analyze(&analyzer, &args.query).await?;
            let limit = (!args.all).then_some(settings.preview_rows);
            let tables = views::price_tables(&analysis, limit);
            match args.query.format {
                OutputFormat::Table => render::prices(&tables),
                OutputFormat::Json => render::json(&tables)?,
            }
        }
        Commands::Metrics(args) => {
            let analysis = analyze(&analyzer, &args).await?;
            let tables = views::metrics_tables(&analysis);
            match args.format {
                OutputFormat::Table => render::metrics(&tables),
                OutputFormat::Json => render::json(&tables)?,
            }
        }
        Commands::KeyMetrics(args) => {
            let analysis = analyze(&analyzer, &args).await?;
            let metrics = views::key_metrics(&analysis, settings.table_rows);
            match args.format {
                OutputFormat::Table => render::key_metrics(&metrics),
                OutputFormat::Json => render::json(&metrics)?,
            }
        }
        Commands::Charts(args) => {
            let analysis = analyze(&analyzer, &args).await?;
            let prices = views::price_charts(
                &analysis,
                settings.chart_window,
                settings.moving_average_window,
            );
            let volume = views::volume_chart(&analysis, settings.chart_window, settings.volume_ticks);
            match args.format {
                OutputFormat::Table => {
                    render::price_charts(&prices);
                    render::volume_chart(&volume);
                }
                OutputFormat::Json => render::json(&serde_json::json!({
                    "price_charts": prices,
                    "volume_chart": volume,
                }))?,
            }
        }
        Commands::Summary(args) => {
            let analysis = analyze(&analyzer, &args).await?;
            let surface = views::ohlc_surface(&analysis, settings.surface_days)
                .ok_or_else(|| anyhow::anyhow!("No data available for the OHLC surface"))?;
            match args.format {
                OutputFormat::Table => render::surface(&surface),
                OutputFormat::Json => render::json(&surface)?,
            }
        }
    }

    Ok(())
}

/// Builds the query from the arguments and runs the pipeline behind a spinner.
async fn analyze(analyzer: &StockAnalyzer, args: &QueryArgs) -> anyhow::Result<Analysis> {
    let (default_start, default_end) = AnalysisQuery::default_range(Local::now().date_naive());
    let query = AnalysisQuery::parse(
        &args.tickers,
        args.start.unwrap_or(default_start),
        args.end.unwrap_or(default_end),
    )?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Downloading data for {}...", query.tickers));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result: Result<Analysis, AnalyzerError> = analyzer.analyze(&query).await;
    match &result {
        Ok(_) => spinner.finish_with_message("Data fetched successfully"),
        Err(_) => spinner.finish_and_clear(),
    }

    Ok(result?)
}
