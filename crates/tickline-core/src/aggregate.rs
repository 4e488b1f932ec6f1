//! Tick to OHLC aggregation.

use crate::{Bar, Tick, ValidationError};

/// Chunk size the chart layer uses when the caller does not pick one.
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// Fold `ticks` into bars of `chunk_size` consecutive ticks each.
///
/// The final chunk may be shorter and is still emitted. Prices come from
/// `last_price`; volume is summed. An empty input yields no bars.
pub fn aggregate_ticks_to_ohlc(
    ticks: &[Tick],
    chunk_size: usize,
) -> Result<Vec<Bar>, ValidationError> {
    if chunk_size == 0 {
        return Err(ValidationError::InvalidChunkSize);
    }

    Ok(ticks.chunks(chunk_size).filter_map(fold_chunk).collect())
}

fn fold_chunk(chunk: &[Tick]) -> Option<Bar> {
    let first = chunk.first()?;
    let last = chunk.last()?;

    let (high, low, volume) = chunk.iter().fold(
        (f64::NEG_INFINITY, f64::INFINITY, 0.0),
        |(high, low, volume), tick| {
            (
                high.max(tick.last_price),
                low.min(tick.last_price),
                volume + f64::from(tick.volume),
            )
        },
    );

    Some(Bar {
        timestamp: first.timestamp.clone(),
        open: first.last_price,
        high,
        low,
        close: last.last_price,
        volume,
    })
}
