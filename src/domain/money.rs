use crate::error::{PaymentError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of decimal places amounts are rounded to before they reach the acquirer.
pub const PRICE_SCALE: u32 = 2;

/// A monetary value in a single currency.
///
/// Arithmetic and comparisons only work between prices of the same currency;
/// there is no conversion. Mixing currencies yields `PaymentError::CurrencyMismatch`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    pub number: Decimal,
    pub currency: String,
}

impl Price {
    pub fn new(number: Decimal, currency: impl Into<String>) -> Self {
        Self {
            number,
            currency: currency.into(),
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.number.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.number > Decimal::ZERO
    }

    /// Rounds half away from zero to two decimal places.
    pub fn round(&self) -> Self {
        Self::new(
            self.number
                .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero),
            self.currency.clone(),
        )
    }

    fn ensure_same_currency(&self, other: &Price) -> Result<()> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(PaymentError::CurrencyMismatch {
                expected: self.currency.clone(),
                actual: other.currency.clone(),
            })
        }
    }

    pub fn checked_add(&self, other: &Price) -> Result<Price> {
        self.ensure_same_currency(other)?;
        let number = self
            .number
            .checked_add(other.number)
            .ok_or_else(|| self.overflow("+", other))?;
        Ok(Self::new(number, self.currency.clone()))
    }

    pub fn checked_sub(&self, other: &Price) -> Result<Price> {
        self.ensure_same_currency(other)?;
        let number = self
            .number
            .checked_sub(other.number)
            .ok_or_else(|| self.overflow("-", other))?;
        Ok(Self::new(number, self.currency.clone()))
    }

    fn overflow(&self, op: &str, other: &Price) -> PaymentError {
        PaymentError::ValidationError(format!("Amount overflow: {} {} {}", self, op, other.number))
    }

    pub fn less_than(&self, other: &Price) -> Result<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.number < other.number)
    }

    pub fn greater_than(&self, other: &Price) -> Result<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.number > other.number)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.currency)
    }
}
