use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// OHLC bar folded from a fixed-size chunk of ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Raw timestamp of the first tick in the chunk.
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Sum of tick volumes in the chunk.
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, ValidationError> {
        validate_finite("open", open)?;
        validate_finite("high", high)?;
        validate_finite("low", low)?;
        validate_finite("close", close)?;
        validate_finite("volume", volume)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            timestamp: timestamp.into(),
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

/// Which extreme of a bar a pivot marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotKind {
    High,
    Low,
}

/// A local price extreme at a bar index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    /// Bar index in the series the pivot was detected on.
    pub x: usize,
    pub y: f64,
    pub kind: PivotKind,
}

impl Pivot {
    pub const fn new(x: usize, y: f64, kind: PivotKind) -> Self {
        Self { x, y, kind }
    }

    pub const fn high(x: usize, y: f64) -> Self {
        Self::new(x, y, PivotKind::High)
    }

    pub const fn low(x: usize, y: f64) -> Self {
        Self::new(x, y, PivotKind::Low)
    }

    pub const fn point(self) -> LinePoint {
        LinePoint {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    /// Direction implied by a slope sign; a flat slope counts as down.
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

/// An ordered run of pivots sharing one directional slope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub points: Vec<Pivot>,
}

impl Trend {
    pub fn first(&self) -> Option<&Pivot> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Pivot> {
        self.points.last()
    }
}

/// A point in bar-index/price space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinePoint {
    pub x: usize,
    pub y: f64,
}

/// Line fitted through a trend's endpoints, possibly extended past its last pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub direction: TrendDirection,
    /// `[first pivot, terminal point]`.
    pub points: [LinePoint; 2],
}

impl TrendLine {
    /// Price on the line at bar index `x`.
    pub fn y_at(&self, x: usize) -> f64 {
        self.slope * x as f64 + self.intercept
    }

    pub const fn start(&self) -> LinePoint {
        self.points[0]
    }

    pub const fn end(&self) -> LinePoint {
        self.points[1]
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}
