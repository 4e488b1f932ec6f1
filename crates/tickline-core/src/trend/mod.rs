//! # Trend Assembly
//!
//! Groups pivots into directional runs and fits trend lines through them.
//!
//! Run-building is pluggable through [`TrendStrategy`]; [`TrendPolicy`] picks
//! one of the built-in strategies from configuration:
//!
//! | Policy | Strategy | Accepts a pivot when its slope |
//! |--------|----------|--------------------------------|
//! | `slope_tolerance` | [`SlopeToleranceStrategy`] | is within `angle_tolerance` |
//! | `direction_continuation` | [`DirectionContinuationStrategy`] | keeps the initial sign |
//!
//! Line extension past the last pivot is controlled separately by [`ExtensionPolicy`].

mod assembler;
mod lines;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::validate_tolerance;
use crate::pivots::{find_pivots, DEFAULT_WINDOW_SIZE};
use crate::{Bar, Pivot, Trend, TrendLine, ValidationError};

pub use assembler::{DirectionContinuationStrategy, SlopeToleranceStrategy};
pub use lines::{build_trend_lines, fit_trend_line, ExtensionPolicy};

pub const DEFAULT_MIN_TOUCHES: usize = 3;
pub const DEFAULT_ANGLE_TOLERANCE: f64 = 0.1;

/// Contract for turning a pivot sequence into trends.
///
/// Implementations must only return trends with at least
/// [`min_touches`](TrendStrategy::min_touches) points, in scan order.
pub trait TrendStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn min_touches(&self) -> usize;

    fn find_trends(&self, pivots: &[Pivot]) -> Vec<Trend>;
}

/// Built-in run-building rule selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPolicy {
    #[default]
    SlopeTolerance,
    DirectionContinuation,
}

/// Parameters for the bars-to-trend-lines pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub window_size: usize,
    pub min_touches: usize,
    /// Maximum slope deviation; only read by [`TrendPolicy::SlopeTolerance`].
    pub angle_tolerance: f64,
    pub policy: TrendPolicy,
    pub extension: ExtensionPolicy,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            min_touches: DEFAULT_MIN_TOUCHES,
            angle_tolerance: DEFAULT_ANGLE_TOLERANCE,
            policy: TrendPolicy::default(),
            extension: ExtensionPolicy::default(),
        }
    }
}

impl TrendConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_policy(mut self, policy: TrendPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_extension(mut self, extension: ExtensionPolicy) -> Self {
        self.extension = extension;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.window_size == 0 {
            return Err(ValidationError::InvalidWindowSize);
        }
        if let ExtensionPolicy::BarRange { tolerance } = self.extension {
            validate_tolerance("extension_tolerance", tolerance)?;
        }
        self.strategy().map(|_| ())
    }

    /// Instantiate the strategy named by `policy`.
    pub fn strategy(&self) -> Result<Box<dyn TrendStrategy>, ValidationError> {
        Ok(match self.policy {
            TrendPolicy::SlopeTolerance => Box::new(SlopeToleranceStrategy::new(
                self.min_touches,
                self.angle_tolerance,
            )?),
            TrendPolicy::DirectionContinuation => {
                Box::new(DirectionContinuationStrategy::new(self.min_touches)?)
            }
        })
    }
}

/// Canonical trend finder with explicit parameters.
pub fn find_trends(
    pivots: &[Pivot],
    min_touches: usize,
    angle_tolerance: f64,
) -> Result<Vec<Trend>, ValidationError> {
    Ok(SlopeToleranceStrategy::new(min_touches, angle_tolerance)?.find_trends(pivots))
}

/// Bars to trend lines: pivots, then trends, then fitted lines.
pub fn calculate_trend(
    bars: &[Bar],
    config: &TrendConfig,
) -> Result<Vec<TrendLine>, ValidationError> {
    config.validate()?;
    let strategy = config.strategy()?;
    calculate_trend_with(bars, config.window_size, strategy.as_ref(), config.extension)
}

/// Same pipeline as [`calculate_trend`] with a caller-supplied strategy.
pub fn calculate_trend_with(
    bars: &[Bar],
    window_size: usize,
    strategy: &dyn TrendStrategy,
    extension: ExtensionPolicy,
) -> Result<Vec<TrendLine>, ValidationError> {
    let pivots = find_pivots(bars, window_size)?;
    let trends: Vec<Trend> = strategy
        .find_trends(&pivots)
        .into_iter()
        .filter(|trend| trend.points.len() >= strategy.min_touches())
        .collect();
    let lines = build_trend_lines(&trends, bars, extension);

    debug!(
        strategy = strategy.name(),
        bars = bars.len(),
        pivots = pivots.len(),
        trends = trends.len(),
        lines = lines.len(),
        "calculated trend lines"
    );

    Ok(lines)
}
