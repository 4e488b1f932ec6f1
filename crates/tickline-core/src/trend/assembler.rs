use crate::error::validate_tolerance;
use crate::{Pivot, Trend, TrendDirection, ValidationError};

use super::TrendStrategy;

/// Canonical assembler: a pivot joins the current run while the slope from
/// the run's first point stays within `angle_tolerance` of the run's initial
/// slope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeToleranceStrategy {
    min_touches: usize,
    angle_tolerance: f64,
}

impl SlopeToleranceStrategy {
    pub fn new(min_touches: usize, angle_tolerance: f64) -> Result<Self, ValidationError> {
        validate_min_touches(min_touches)?;
        validate_tolerance("angle_tolerance", angle_tolerance)?;
        Ok(Self {
            min_touches,
            angle_tolerance,
        })
    }

    pub const fn angle_tolerance(&self) -> f64 {
        self.angle_tolerance
    }
}

impl TrendStrategy for SlopeToleranceStrategy {
    fn name(&self) -> &'static str {
        "slope_tolerance"
    }

    fn min_touches(&self) -> usize {
        self.min_touches
    }

    fn find_trends(&self, pivots: &[Pivot]) -> Vec<Trend> {
        let tolerance = self.angle_tolerance;
        assemble_runs(pivots, self.min_touches, |initial, slope| {
            (slope - initial).abs() <= tolerance
        })
    }
}

/// Looser assembler: a pivot joins the current run while the slope from the
/// run's first point points the same way as the initial slope, whatever its
/// magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionContinuationStrategy {
    min_touches: usize,
}

impl DirectionContinuationStrategy {
    pub fn new(min_touches: usize) -> Result<Self, ValidationError> {
        validate_min_touches(min_touches)?;
        Ok(Self { min_touches })
    }
}

impl TrendStrategy for DirectionContinuationStrategy {
    fn name(&self) -> &'static str {
        "direction_continuation"
    }

    fn min_touches(&self) -> usize {
        self.min_touches
    }

    fn find_trends(&self, pivots: &[Pivot]) -> Vec<Trend> {
        assemble_runs(pivots, self.min_touches, |initial, slope| {
            slope.is_finite()
                && TrendDirection::from_slope(slope) == TrendDirection::from_slope(initial)
        })
    }
}

fn validate_min_touches(min_touches: usize) -> Result<(), ValidationError> {
    if min_touches < 2 {
        return Err(ValidationError::InvalidMinTouches { value: min_touches });
    }
    Ok(())
}

/// Shared run-building scan. `accepts(initial_slope, slope)` decides whether
/// a pivot extends the current run once the run's initial slope is known.
fn assemble_runs<F>(pivots: &[Pivot], min_touches: usize, accepts: F) -> Vec<Trend>
where
    F: Fn(f64, f64) -> bool,
{
    let mut trends = Vec::new();
    let mut remaining = pivots.iter().copied();
    let Some(seed) = remaining.next() else {
        return trends;
    };

    let mut current = vec![seed];
    let mut initial_slope: Option<f64> = None;
    let mut last_slope: Option<f64> = None;

    for point in remaining {
        if current.len() == 1 {
            current.push(point);
            continue;
        }

        let slope = slope_between(current[0], point);
        let Some(initial) = initial_slope else {
            initial_slope = Some(slope);
            last_slope = Some(slope);
            current.push(point);
            continue;
        };

        if accepts(initial, slope) {
            current.push(point);
            continue;
        }

        let tail = current[current.len() - 1];
        let finished = std::mem::replace(&mut current, vec![tail, point]);
        if finished.len() >= min_touches {
            trends.push(Trend {
                direction: TrendDirection::from_slope(initial),
                points: finished,
            });
        }
        initial_slope = None;
    }

    if current.len() >= min_touches {
        let direction = last_slope.map_or(TrendDirection::Up, TrendDirection::from_slope);
        trends.push(Trend {
            direction,
            points: current,
        });
    }

    trends
}

fn slope_between(from: Pivot, to: Pivot) -> f64 {
    (to.y - from.y) / (to.x as f64 - from.x as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xs(trend: &Trend) -> Vec<usize> {
        trend.points.iter().map(|point| point.x).collect()
    }

    #[test]
    fn collinear_pivots_form_one_up_trend() {
        let pivots: Vec<Pivot> = (0..5).map(|i| Pivot::low(i * 2, 100.0 + i as f64)).collect();
        let strategy = SlopeToleranceStrategy::new(3, 0.1).expect("strategy");

        let trends = strategy.find_trends(&pivots);

        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].direction, TrendDirection::Up);
        assert_eq!(xs(&trends[0]), vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn slope_break_emits_run_and_restarts_from_its_last_point() {
        let pivots = vec![
            Pivot::high(0, 10.0),
            Pivot::high(1, 9.0),
            Pivot::high(2, 8.0),
            Pivot::high(3, 7.0),
            Pivot::high(4, 20.0),
            Pivot::high(5, 30.0),
        ];
        let strategy = SlopeToleranceStrategy::new(3, 0.1).expect("strategy");

        let trends = strategy.find_trends(&pivots);

        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].direction, TrendDirection::Down);
        assert_eq!(xs(&trends[0]), vec![0, 1, 2, 3]);
        // restarted run is [3, 4], then 5 fixes its slope
        assert_eq!(xs(&trends[1]), vec![3, 4, 5]);
        assert_eq!(trends[1].direction, TrendDirection::Up);
    }

    #[test]
    fn never_emits_fewer_than_min_touches() {
        let pivots = vec![
            Pivot::high(0, 1.0),
            Pivot::low(1, 5.0),
            Pivot::high(2, 1.0),
            Pivot::low(3, 9.0),
        ];
        let strategy = SlopeToleranceStrategy::new(4, 0.0).expect("strategy");

        let trends = strategy.find_trends(&pivots);

        assert!(trends.iter().all(|trend| trend.points.len() >= 4));
    }

    #[test]
    fn fewer_than_two_pivots_yield_nothing() {
        let strategy = SlopeToleranceStrategy::new(2, 0.1).expect("strategy");
        assert!(strategy.find_trends(&[]).is_empty());
        assert!(strategy.find_trends(&[Pivot::low(3, 1.0)]).is_empty());
    }

    #[test]
    fn two_point_trailing_run_defaults_to_up() {
        let strategy = SlopeToleranceStrategy::new(2, 0.1).expect("strategy");
        let trends = strategy.find_trends(&[Pivot::high(1, 5.0), Pivot::high(4, 2.0)]);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].direction, TrendDirection::Up);
    }

    #[test]
    fn direction_continuation_ignores_slope_magnitude() {
        let pivots = vec![
            Pivot::low(0, 100.0),
            Pivot::low(1, 101.0),
            Pivot::low(2, 102.0),
            Pivot::low(3, 110.0),
            Pivot::low(4, 150.0),
            Pivot::low(5, 90.0),
        ];

        let tolerant = DirectionContinuationStrategy::new(3).expect("strategy");
        let strict = SlopeToleranceStrategy::new(3, 0.1).expect("strategy");

        let loose = tolerant.find_trends(&pivots);
        assert_eq!(xs(&loose[0]), vec![0, 1, 2, 3, 4]);
        assert_eq!(loose[0].direction, TrendDirection::Up);

        let tight = strict.find_trends(&pivots);
        assert_eq!(xs(&tight[0]), vec![0, 1, 2]);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert_eq!(
            SlopeToleranceStrategy::new(1, 0.1),
            Err(ValidationError::InvalidMinTouches { value: 1 })
        );
        assert!(SlopeToleranceStrategy::new(3, -1.0).is_err());
        assert!(DirectionContinuationStrategy::new(0).is_err());
    }
}
