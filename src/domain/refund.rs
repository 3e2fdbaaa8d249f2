use super::money::Price;
use super::payment::{Payment, PaymentState};
use crate::error::{PaymentError, Result};
use serde::Serialize;
use std::fmt;

/// Whether a single refund request covers the whole payment amount.
///
/// Reported to the acquirer and in logs; it does not decide the resulting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefundType {
    Partial,
    Full,
}

impl RefundType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RefundType::Partial => "Partial",
            RefundType::Full => "Full",
        }
    }
}

impl fmt::Display for RefundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefundOutcome {
    pub new_refunded_total: Price,
    pub resulting_state: PaymentState,
    pub refund_type: RefundType,
}

/// Sizes refunds against what has already been refunded on a payment.
pub struct AmountReconciler;

impl AmountReconciler {
    pub fn apply(payment: &Payment, requested: &Price) -> Result<RefundOutcome> {
        if !requested.is_positive() {
            return Err(PaymentError::ValidationError(
                "Refund amount must be positive".to_string(),
            ));
        }

        let new_refunded_total = payment.refunded_amount.checked_add(requested)?;
        if new_refunded_total.greater_than(&payment.amount)? {
            return Err(PaymentError::RefundExceedsBalance {
                requested: requested.number,
                balance: payment.balance()?.number,
            });
        }

        let resulting_state = if new_refunded_total.less_than(&payment.amount)? {
            PaymentState::PartiallyRefunded
        } else {
            PaymentState::Refunded
        };

        let refund_type = if requested.less_than(&payment.amount)? {
            RefundType::Partial
        } else {
            RefundType::Full
        };

        Ok(RefundOutcome {
            new_refunded_total,
            resulting_state,
            refund_type,
        })
    }
}
