//! Load a date range, fold it into bars and print the detected trend lines.
//!
//! ```text
//! cargo run -p tickline-loader --example range_trends -- <data_root> <start> <end> [chunk_size]
//! cargo run -p tickline-loader --example range_trends -- <data_root> --stats
//! ```
//!
//! Set `RUST_LOG=debug` to see per-day cache and decode events.

use std::error::Error;
use std::path::PathBuf;

use tickline_core::{aggregate_ticks_to_ohlc, calculate_trend, TrendConfig, DEFAULT_CHUNK_SIZE};
use tickline_loader::{collect_folder_stats, LoaderConfig, RangeRequest, TickLoader};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = LoaderConfig {
        data_root: args
            .first()
            .map(PathBuf::from)
            .unwrap_or_else(|| LoaderConfig::default().data_root),
        ..LoaderConfig::default()
    };

    if args.get(1).map(String::as_str) == Some("--stats") {
        let stats = collect_folder_stats(&config.data_root, &config.file_extension)?;
        println!(
            "{} files ({} unreadable), {} rows",
            stats.scanned_files, stats.failed_files, stats.total_rows
        );
        for file in &stats.files {
            println!("{}: {} rows, columns {:?}", file.path.display(), file.rows, file.columns);
        }
        return Ok(());
    }

    let (Some(start), Some(end)) = (args.get(1), args.get(2)) else {
        return Err(
            "usage: range_trends <data_root> <start YYYY-MM-DD> <end YYYY-MM-DD> [chunk]".into(),
        );
    };
    let chunk_size = match args.get(3) {
        Some(value) => value.parse()?,
        None => DEFAULT_CHUNK_SIZE,
    };

    let loader = TickLoader::new(config)?;
    let load = loader.load_request(&RangeRequest::parse_days(start, end)?).await?;
    let bars = aggregate_ticks_to_ohlc(&load.ticks, chunk_size)?;
    let lines = calculate_trend(&bars, &TrendConfig::default())?;

    println!(
        "{} ticks from {} days ({} missing) -> {} bars -> {} trend lines",
        load.ticks.len(),
        load.report.cached_days + load.report.fetched_days,
        load.report.missing_days,
        bars.len(),
        lines.len()
    );
    for line in &lines {
        let (start, end) = (line.start(), line.end());
        println!(
            "{:?}: ({}, {:.2}) -> ({}, {:.2}) slope {:.4}",
            line.direction, start.x, start.y, end.x, end.y, line.slope
        );
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
