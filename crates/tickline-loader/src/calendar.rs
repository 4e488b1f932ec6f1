//! Day spans and the per-day file layout.

use std::path::{Path, PathBuf};

use time::Date;

use tickline_core::{format_iso_date, parse_iso_date, ValidationError};

/// Inclusive span of calendar days, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    start: Date,
    end: Date,
}

impl DateSpan {
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange {
                start: format_iso_date(start),
                end: format_iso_date(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_iso_date(start)?, parse_iso_date(end)?)
    }

    pub const fn start(&self) -> Date {
        self.start
    }

    pub const fn end(&self) -> Date {
        self.end
    }

    /// Every day in the span, ascending.
    pub fn days(&self) -> Vec<Date> {
        let mut days = Vec::new();
        let mut day = self.start;
        loop {
            days.push(day);
            if day >= self.end {
                break;
            }
            match day.next_day() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}

/// `<root>/<YYYY>/<MM>/tickdata_<YYYY>-<MM>-<DD>.<extension>`
pub fn day_file_path(root: &Path, date: Date, extension: &str) -> PathBuf {
    root.join(format!("{:04}", date.year()))
        .join(format!("{:02}", u8::from(date.month())))
        .join(format!("tickdata_{}.{extension}", format_iso_date(date)))
}
