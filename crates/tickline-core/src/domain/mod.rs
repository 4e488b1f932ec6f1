//! # Domain Models
//!
//! Value types that flow through the tick-to-trend pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Tick`] | Raw quote/trade record from a per-day file |
//! | [`TickTimestamp`] | Decoded fixed-width tick timestamp |
//! | [`Bar`] | OHLC bar folded from a chunk of ticks |
//! | [`Pivot`] | Local high or low at a bar index |
//! | [`Trend`] | Run of pivots sharing one slope |
//! | [`TrendLine`] | Line through a trend's endpoints, optionally extended |
//!
//! Everything except [`Tick`] is produced fresh per computation; nothing here
//! holds shared state.

mod models;
mod tick;
mod timestamp;

pub use models::{Bar, LinePoint, Pivot, PivotKind, Trend, TrendDirection, TrendLine};
pub use tick::Tick;
pub use timestamp::{format_iso_date, parse_iso_date, TickTimestamp};
