use serde::{Deserialize, Serialize};

use crate::{Bar, LinePoint, Trend, TrendLine};

/// How far a fitted line is carried past its trend's last pivot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtensionPolicy {
    /// Plain two-point segment ending on the last pivot.
    None,
    /// Extend bar by bar up to the last bar, stopping before the next trend's first x.
    #[default]
    UntilNextTrend,
    /// Like `UntilNextTrend`, but also stop at the first bar whose
    /// `[low - tolerance, high + tolerance]` range no longer contains the projection.
    BarRange { tolerance: f64 },
}

/// Fit one line per trend. Trends whose endpoints share an x are dropped.
pub fn build_trend_lines(
    trends: &[Trend],
    bars: &[Bar],
    extension: ExtensionPolicy,
) -> Vec<TrendLine> {
    trends
        .iter()
        .enumerate()
        .filter_map(|(index, trend)| {
            let next_start = trends
                .get(index + 1)
                .and_then(Trend::first)
                .map(|pivot| pivot.x);
            fit_trend_line(trend, bars, next_start, extension)
        })
        .collect()
}

/// Two-point fit through the first and last pivot of `trend`, extended per `extension`.
pub fn fit_trend_line(
    trend: &Trend,
    bars: &[Bar],
    next_start: Option<usize>,
    extension: ExtensionPolicy,
) -> Option<TrendLine> {
    let first = *trend.first()?;
    let last = *trend.last()?;
    if first.x == last.x {
        return None;
    }

    let slope = (last.y - first.y) / (last.x as f64 - first.x as f64);
    let intercept = first.y - slope * first.x as f64;
    if !slope.is_finite() || !intercept.is_finite() {
        return None;
    }

    let project = |x: usize| LinePoint {
        x,
        y: slope * x as f64 + intercept,
    };
    let stop = next_start.map_or(bars.len(), |start| start.min(bars.len()));
    let following = (last.x + 1)..stop;

    let end = match extension {
        ExtensionPolicy::None => last.point(),
        ExtensionPolicy::UntilNextTrend => following.last().map_or(last.point(), project),
        ExtensionPolicy::BarRange { tolerance } => following
            .map_while(|x| {
                let point = project(x);
                let bar = &bars[x];
                let inside = point.y >= bar.low - tolerance && point.y <= bar.high + tolerance;
                inside.then_some(point)
            })
            .last()
            .unwrap_or(last.point()),
    };

    Some(TrendLine {
        slope,
        intercept,
        direction: trend.direction,
        points: [first.point(), end],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pivot, TrendDirection};

    fn flat_bars(count: usize, low: f64, high: f64) -> Vec<Bar> {
        (0..count)
            .map(|_| Bar {
                timestamp: String::new(),
                open: low,
                high,
                low,
                close: high,
                volume: 0.0,
            })
            .collect()
    }

    fn up_trend(points: &[(usize, f64)]) -> Trend {
        Trend {
            direction: TrendDirection::Up,
            points: points.iter().map(|&(x, y)| Pivot::low(x, y)).collect(),
        }
    }

    #[test]
    fn fits_through_endpoints_and_extends_to_last_bar() {
        let trend = up_trend(&[(1, 10.0), (3, 12.0), (5, 14.0)]);
        let bars = flat_bars(10, 0.0, 100.0);

        let lines = build_trend_lines(&[trend], &bars, ExtensionPolicy::UntilNextTrend);

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.slope, 1.0);
        assert_eq!(line.intercept, 9.0);
        assert_eq!(line.start(), LinePoint { x: 1, y: 10.0 });
        assert_eq!(line.end(), LinePoint { x: 9, y: 18.0 });
    }

    #[test]
    fn stops_before_next_trend_start() {
        let first = up_trend(&[(0, 1.0), (1, 2.0), (2, 3.0)]);
        let second = up_trend(&[(6, 1.0), (7, 1.5), (8, 2.0)]);
        let bars = flat_bars(12, 0.0, 100.0);

        let lines = build_trend_lines(&[first, second], &bars, ExtensionPolicy::UntilNextTrend);

        assert_eq!(lines[0].end().x, 5);
        assert_eq!(lines[1].end().x, 11);
    }

    #[test]
    fn no_extension_keeps_last_pivot() {
        let trend = up_trend(&[(0, 1.0), (2, 2.0), (4, 3.0)]);
        let bars = flat_bars(10, 0.0, 100.0);
        let lines = build_trend_lines(&[trend], &bars, ExtensionPolicy::None);
        assert_eq!(lines[0].end(), LinePoint { x: 4, y: 3.0 });
    }

    #[test]
    fn bar_range_extension_stops_when_projection_leaves_the_bars() {
        // projection is 10 + x; bars cap at 15 + 0.5 tolerance
        let trend = up_trend(&[(0, 10.0), (1, 11.0), (2, 12.0)]);
        let bars = flat_bars(10, 0.0, 15.0);

        let lines = build_trend_lines(
            &[trend],
            &bars,
            ExtensionPolicy::BarRange { tolerance: 0.5 },
        );

        assert_eq!(lines[0].end(), LinePoint { x: 5, y: 15.0 });
    }

    #[test]
    fn vertical_trend_is_dropped() {
        let trend = Trend {
            direction: TrendDirection::Down,
            points: vec![Pivot::high(4, 9.0), Pivot::low(4, 1.0), Pivot::high(4, 8.0)],
        };
        assert!(build_trend_lines(&[trend], &flat_bars(6, 0.0, 1.0), ExtensionPolicy::None)
            .is_empty());
    }

    #[test]
    fn last_pivot_on_final_bar_is_not_extended() {
        let trend = up_trend(&[(0, 1.0), (2, 2.0), (4, 3.0)]);
        let lines = build_trend_lines(
            &[trend],
            &flat_bars(5, 0.0, 10.0),
            ExtensionPolicy::default(),
        );
        assert_eq!(lines[0].end(), LinePoint { x: 4, y: 3.0 });
    }
}
