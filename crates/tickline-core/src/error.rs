use thiserror::Error;

/// Validation and contract errors exposed by `tickline-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("tick timestamp must be at least 15 characters, got {len}")]
    TimestampTooShort { len: usize },
    #[error("tick timestamp must be 'YYYYMMDD?HHMMSS' with a valid date and time: '{value}'")]
    InvalidTimestamp { value: String },

    #[error("date must be 'YYYY-MM-DD': '{value}'")]
    InvalidDate { value: String },
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    #[error("pivot window size must be greater than zero")]
    InvalidWindowSize,
    #[error("minimum touches must be at least 2, got {value}")]
    InvalidMinTouches { value: usize },
    #[error("field '{field}' must be a finite, non-negative tolerance")]
    InvalidTolerance { field: &'static str },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("bar open/close must be within high/low range")]
    InvalidBarBounds,
}

/// Validate a tolerance parameter (`angle_tolerance`, extension tolerance).
pub(crate) fn validate_tolerance(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidTolerance { field });
    }
    Ok(())
}
