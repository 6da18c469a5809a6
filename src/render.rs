//! Terminal rendering of the analyzer views.

use analyzer::views::{DatedValue, KeyMetrics, MetricsTable, OhlcSurface, PriceChart, PriceTable, VolumeChart};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use rust_decimal::Decimal;
use serde::Serialize;

/// Width of the longest bar in the volume chart, in characters.
const BAR_WIDTH: u64 = 40;
const MISSING: &str = "-";

fn new_table<const N: usize>(header: [&str; N]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn number(value: Decimal) -> Cell {
    Cell::new(value.round_dp(2)).set_alignment(CellAlignment::Right)
}

fn optional(value: Option<Decimal>) -> Cell {
    match value {
        Some(v) => number(v),
        None => Cell::new(MISSING).set_alignment(CellAlignment::Right),
    }
}

fn dated(value: Option<&DatedValue>) -> [Cell; 2] {
    match value {
        Some(v) => [Cell::new(v.date), optional(v.value)],
        None => [Cell::new(""), Cell::new("")],
    }
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn prices(tables: &[PriceTable]) {
    for price_table in tables {
        let mut table = new_table(["Date", "Open", "High", "Low", "Close", "Volume"]);
        for row in &price_table.rows {
            table.add_row(vec![
                Cell::new(row.date),
                number(row.open),
                number(row.high),
                number(row.low),
                number(row.close),
                Cell::new(row.volume).set_alignment(CellAlignment::Right),
            ]);
        }
        println!("\n{}\n{table}", price_table.ticker);
    }
}

pub fn metrics(tables: &[MetricsTable]) {
    for metrics in tables {
        let mut table = new_table(["Date", "Close", "Previous Close", "Change", "% Change"]);
        for row in &metrics.rows {
            table.add_row(vec![
                Cell::new(row.date),
                number(row.close),
                number(row.previous_close),
                number(row.price_change),
                optional(row.percent_change),
            ]);
        }
        println!("\n{}\n{table}", metrics.ticker);

        for row in metrics.rows.iter().filter(|r| r.note.is_some()) {
            println!("  {}: {}", row.date, row.note.as_deref().unwrap_or_default());
        }

        let summary = &metrics.summary;
        println!(
            "  {} -> {}: {} -> {} ({} / {}%)",
            summary.start_date,
            summary.end_date,
            summary.first_close.round_dp(2),
            summary.last_close.round_dp(2),
            summary.change.round_dp(2),
            summary
                .percent_change
                .map(|p| p.round_dp(2).to_string())
                .unwrap_or_else(|| MISSING.to_string()),
        );
    }
}

pub fn key_metrics(all: &[KeyMetrics]) {
    for metrics in all {
        let mut table = new_table([
            "Date",
            "Current Price",
            "Date",
            "% Change",
            "Date",
            "52-Week High",
            "Date",
            "52-Week Low",
        ]);
        let rows = metrics.price.len().max(metrics.percent_change.len());
        for i in 0..rows {
            let mut cells = Vec::with_capacity(8);
            cells.extend(dated(metrics.price.get(i)));
            cells.extend(dated(metrics.percent_change.get(i)));
            cells.extend(dated(metrics.high_52_week.get(i)));
            cells.extend(dated(metrics.low_52_week.get(i)));
            table.add_row(cells);
        }
        println!("\n{}\n{table}", metrics.ticker);
    }
}

pub fn price_charts(charts: &[PriceChart]) {
    for chart in charts {
        let average = format!("{}-Day MA", chart.moving_average_window);
        let mut table = new_table(["Date", "Open", "Close", average.as_str()]);
        for point in &chart.points {
            table.add_row(vec![
                Cell::new(point.date),
                number(point.open),
                number(point.close),
                optional(point.moving_average),
            ]);
        }
        println!("\n{} price and moving average\n{table}", chart.ticker);
    }
}

pub fn volume_chart(chart: &VolumeChart) {
    let labels: Vec<&str> = chart.ticks.iter().map(|t| t.label.as_str()).collect();
    println!("\nVolume axis: {}", labels.join("  "));

    for series in &chart.series {
        let mut table = new_table(["Date", "Volume", ""]);
        for bar in &series.bars {
            let width = if chart.max_volume == 0 {
                0
            } else {
                (u128::from(bar.volume) * u128::from(BAR_WIDTH) / u128::from(chart.max_volume)) as usize
            };
            table.add_row(vec![
                Cell::new(bar.date),
                Cell::new(scaled_volume(bar.volume, chart.scale.factor, chart.scale.suffix))
                    .set_alignment(CellAlignment::Right),
                Cell::new("█".repeat(width)),
            ]);
        }
        println!("\n{} volume\n{table}", series.ticker);
    }
}

fn scaled_volume(volume: u64, factor: u64, suffix: &str) -> String {
    let scaled = Decimal::from(volume) / Decimal::from(factor.max(1));
    format!("{}{suffix}", scaled.round_dp(2))
}

pub fn surface(surface: &OhlcSurface) {
    let [open, high, low, close] = surface.rows;
    let mut table = new_table(["Date", open, high, low, close]);
    for (i, date) in surface.dates.iter().enumerate() {
        let mut cells = vec![Cell::new(date)];
        cells.extend(surface.z.iter().map(|row| optional(row.get(i).copied())));
        table.add_row(cells);
    }
    println!("\n{} OHLC surface\n{table}", surface.ticker);
}
