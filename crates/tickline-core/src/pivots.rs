//! Turning-point (pivot) detection over a bar series.

use crate::{Bar, Pivot, ValidationError};

/// Default half-width of the neighbourhood a pivot must dominate.
pub const DEFAULT_WINDOW_SIZE: usize = 2;

/// Scan `bars` for strict local extremes.
///
/// A bar at `i` is a high pivot when its high is strictly above the high of
/// every bar in `[i - window_size, i)` and `(i, i + window_size]`; low pivots
/// mirror this on lows. One bar can yield both (an engulfing bar), in which
/// case the high pivot comes first. Bars within `window_size` of either end
/// are never pivots.
pub fn find_pivots(bars: &[Bar], window_size: usize) -> Result<Vec<Pivot>, ValidationError> {
    if window_size == 0 {
        return Err(ValidationError::InvalidWindowSize);
    }

    let mut pivots = Vec::new();
    if bars.len() <= window_size.saturating_mul(2) {
        return Ok(pivots);
    }

    let last_candidate = bars.len() - window_size;
    for (index, bar) in bars.iter().enumerate().take(last_candidate).skip(window_size) {
        let before = &bars[index - window_size..index];
        let after = &bars[index + 1..=index + window_size];

        let is_high = before.iter().chain(after).all(|other| other.high < bar.high);
        let is_low = before.iter().chain(after).all(|other| other.low > bar.low);

        if is_high {
            pivots.push(Pivot::high(index, bar.high));
        }
        if is_low {
            pivots.push(Pivot::low(index, bar.low));
        }
    }

    Ok(pivots)
}
