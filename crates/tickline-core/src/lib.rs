//! # Tickline Core
//!
//! Domain types and algorithms that turn raw market ticks into OHLC bars and
//! multi-touch trend lines for chart overlays.
//!
//! ## Overview
//!
//! - **Timestamp codec** for the fixed-width `YYYYMMDD HHMMSS` tick format
//! - **OHLC aggregation** of consecutive tick chunks into bars
//! - **Pivot detection** of strict local highs and lows
//! - **Trend assembly** of pivots into runs, behind a pluggable strategy
//! - **Trend-line fitting** with configurable extension past the last pivot
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregate`] | Tick to OHLC folding |
//! | [`domain`] | Tick, Bar, Pivot, Trend, TrendLine, TickTimestamp |
//! | [`error`] | Validation errors |
//! | [`pivots`] | Turning-point detection |
//! | [`trend`] | Trend strategies, configuration and line fitting |
//!
//! ## Quick Start
//!
//! ```rust
//! use tickline_core::{aggregate_ticks_to_ohlc, calculate_trend, Tick, TrendConfig};
//!
//! # fn main() -> Result<(), tickline_core::ValidationError> {
//! let ticks: Vec<Tick> = (0..400)
//!     .map(|i| {
//!         let price = 100.0 + ((i as f64) / 7.0).sin() * 5.0 + i as f64 * 0.05;
//!         Tick::new(format!("20240614 09{:02}{:02}", i / 60, i % 60), price, price, price, 1)
//!     })
//!     .collect::<Result<_, _>>()?;
//!
//! let bars = aggregate_ticks_to_ohlc(&ticks, 4)?;
//! let lines = calculate_trend(&bars, &TrendConfig::default())?;
//! for line in &lines {
//!     println!("{:?} from x={} to x={}", line.direction, line.start().x, line.end().x);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Caller-contract violations (zero chunk size, zero window, fewer than two
//! touches, negative tolerances) are reported as [`ValidationError`] before
//! any work is done. Degenerate geometry (a trend whose endpoints share an x)
//! is dropped silently rather than reported.

pub mod aggregate;
pub mod domain;
pub mod error;
pub mod pivots;
pub mod trend;

pub use aggregate::{aggregate_ticks_to_ohlc, DEFAULT_CHUNK_SIZE};
pub use domain::{
    format_iso_date, parse_iso_date, Bar, LinePoint, Pivot, PivotKind, Tick, TickTimestamp,
    Trend, TrendDirection, TrendLine,
};
pub use error::ValidationError;
pub use pivots::{find_pivots, DEFAULT_WINDOW_SIZE};
pub use trend::{
    build_trend_lines, calculate_trend, calculate_trend_with, find_trends, fit_trend_line,
    DirectionContinuationStrategy, ExtensionPolicy, SlopeToleranceStrategy, TrendConfig,
    TrendPolicy, TrendStrategy, DEFAULT_ANGLE_TOLERANCE, DEFAULT_MIN_TOUCHES,
};
