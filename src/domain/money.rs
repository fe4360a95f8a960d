use crate::error::PaymentError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

/// Represents a positive transaction total.
///
/// This is a wrapper around `rust_decimal::Decimal` so a zero or negative
/// total never reaches the gateway.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::InvalidArgument(format!(
                "total must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// An amount already rendered in the gateway's fixed-point text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedAmount(String);

impl FormattedAmount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormattedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts a monetary value into the text the gateway expects in `TOTAL`.
pub trait AmountFormatter: Send + Sync {
    fn format(&self, amount: Amount) -> FormattedAmount;
}

/// Fixed-point rendering with `.` as decimal separator and no grouping.
///
/// Rounds half-to-even to `places` digits.
#[derive(Debug, Clone, Copy)]
pub struct FixedPointFormatter {
    pub places: u32,
}

impl Default for FixedPointFormatter {
    fn default() -> Self {
        Self { places: 2 }
    }
}

impl AmountFormatter for FixedPointFormatter {
    fn format(&self, amount: Amount) -> FormattedAmount {
        let rounded = amount
            .value()
            .round_dp_with_strategy(self.places, RoundingStrategy::MidpointNearestEven);
        FormattedAmount(format!("{:.*}", self.places as usize, rounded))
    }
}
