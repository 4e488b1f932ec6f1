use serde::{Deserialize, Serialize};

use crate::{TickTimestamp, ValidationError};

/// A single quote/trade record as written by the upstream per-day files.
///
/// Field names serialize in the camelCase shape the chart layer consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tick {
    pub timestamp: String,
    pub last_price: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub volume: i32,
}

impl Tick {
    /// Build a tick, rejecting non-finite prices.
    ///
    /// The timestamp is kept verbatim; use [`Tick::parsed_timestamp`] to decode it.
    pub fn new(
        timestamp: impl Into<String>,
        last_price: f64,
        bid_price: f64,
        ask_price: f64,
        volume: i32,
    ) -> Result<Self, ValidationError> {
        validate_finite("last_price", last_price)?;
        validate_finite("bid_price", bid_price)?;
        validate_finite("ask_price", ask_price)?;

        Ok(Self {
            timestamp: timestamp.into(),
            last_price,
            bid_price,
            ask_price,
            volume,
        })
    }

    pub fn parsed_timestamp(&self) -> Result<TickTimestamp, ValidationError> {
        TickTimestamp::parse(&self.timestamp)
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_prices() {
        let err = Tick::new("20240614 093015", f64::NAN, 1.0, 1.0, 1).expect_err("must fail");
        assert_eq!(
            err,
            ValidationError::NonFiniteValue {
                field: "last_price"
            }
        );
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let tick = Tick::new("20240614 093015", 5300.25, 5300.0, 5300.5, 3).expect("tick");
        let json = serde_json::to_value(&tick).expect("serialize");
        assert_eq!(json["lastPrice"], 5300.25);
        assert_eq!(json["askPrice"], 5300.5);
        assert_eq!(json["volume"], 3);
    }
}
