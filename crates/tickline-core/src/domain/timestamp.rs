use std::fmt::{Display, Formatter};
use std::ops::Range;

use time::macros::{format_description, time};
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::ValidationError;

/// Calendar-comparable timestamp decoded from the fixed-width tick format.
///
/// The raw layout is `YYYYMMDD?HHMMSS[?fraction]`: date digits at `[0,8)`,
/// one separator byte, time digits at `[9,15)`. Anything after position 15
/// (fractional seconds) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickTimestamp(PrimitiveDateTime);

impl TickTimestamp {
    /// Shortest raw timestamp the codec accepts.
    pub const MIN_LEN: usize = 15;

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.len() < Self::MIN_LEN {
            return Err(ValidationError::TimestampTooShort { len: input.len() });
        }

        let invalid = || ValidationError::InvalidTimestamp {
            value: input.to_owned(),
        };

        let year = digits(input, 0..4).ok_or_else(invalid)?;
        let month = two_digits(input, 4..6).ok_or_else(invalid)?;
        let day = two_digits(input, 6..8).ok_or_else(invalid)?;
        let hour = two_digits(input, 9..11).ok_or_else(invalid)?;
        let minute = two_digits(input, 11..13).ok_or_else(invalid)?;
        let second = two_digits(input, 13..15).ok_or_else(invalid)?;

        let month = Month::try_from(month).map_err(|_| invalid())?;
        let year = i32::try_from(year).map_err(|_| invalid())?;
        let date = Date::from_calendar_date(year, month, day).map_err(|_| invalid())?;
        let time = Time::from_hms(hour, minute, second).map_err(|_| invalid())?;

        Ok(Self(PrimitiveDateTime::new(date, time)))
    }

    pub const fn from_date_time(value: PrimitiveDateTime) -> Self {
        Self(value)
    }

    /// First instant of `date`.
    pub const fn start_of_day(date: Date) -> Self {
        Self(PrimitiveDateTime::new(date, Time::MIDNIGHT))
    }

    /// Last whole second of `date`.
    pub const fn end_of_day(date: Date) -> Self {
        Self(PrimitiveDateTime::new(date, time!(23:59:59)))
    }

    pub const fn date(self) -> Date {
        self.0.date()
    }

    pub const fn into_inner(self) -> PrimitiveDateTime {
        self.0
    }
}

impl Display for TickTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}:{:02}",
            format_iso_date(self.0.date()),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

/// Parse an ISO calendar date (`YYYY-MM-DD`).
pub fn parse_iso_date(input: &str) -> Result<Date, ValidationError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]")).map_err(|_| {
        ValidationError::InvalidDate {
            value: input.to_owned(),
        }
    })
}

/// Format a date as `YYYY-MM-DD`; this is also the per-date cache key.
pub fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn digits(input: &str, range: Range<usize>) -> Option<u32> {
    let segment = input.get(range)?;
    if !segment.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn two_digits(input: &str, range: Range<usize>) -> Option<u8> {
    digits(input, range).and_then(|value| u8::try_from(value).ok())
}
