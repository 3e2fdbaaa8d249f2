use super::money::Price;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Opaque payment identifier, assigned by the payment store on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PaymentId(pub Uuid);

impl PaymentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a payment.
///
/// `New` only exists before the payment is persisted; the store never holds it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    New,
    Authorization,
    AuthorizationVoided,
    AuthorizationExpired,
    Completed,
    PartiallyRefunded,
    Refunded,
}

impl PaymentState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentState::New => "new",
            PaymentState::Authorization => "authorization",
            PaymentState::AuthorizationVoided => "authorization_voided",
            PaymentState::AuthorizationExpired => "authorization_expired",
            PaymentState::Completed => "completed",
            PaymentState::PartiallyRefunded => "partially_refunded",
            PaymentState::Refunded => "refunded",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentState::AuthorizationVoided
                | PaymentState::AuthorizationExpired
                | PaymentState::Refunded
        )
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields handed to `PaymentStore::create`; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub order_id: String,
    pub amount: Price,
    pub state: PaymentState,
    pub remote_id: String,
    pub remote_state: String,
    pub return_message: String,
}

/// The unit of reconciliation between the browser return and acquirer notifications.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: PaymentId,
    /// The owning order. Not owned by the payment.
    pub order_id: String,
    /// Authorized or captured amount.
    pub amount: Price,
    /// Cumulative refunds; always between zero and `amount`.
    pub refunded_amount: Price,
    pub state: PaymentState,
    /// Acquirer transaction id used to join notifications. Empty when the
    /// protocol variant supplies none on the synchronous return.
    pub remote_id: String,
    /// Last raw status reported by the acquirer, kept for audit.
    pub remote_state: String,
    /// Message shown to the customer when the payment was created.
    #[serde(default)]
    pub return_message: String,
    /// Keys of notifications already applied to this payment.
    #[serde(default)]
    pub applied_notifications: BTreeSet<String>,
}

impl Payment {
    pub fn from_new(id: PaymentId, new: NewPayment) -> Self {
        let refunded_amount = Price::zero(new.amount.currency.clone());
        Self {
            id,
            order_id: new.order_id,
            amount: new.amount,
            refunded_amount,
            state: new.state,
            remote_id: new.remote_id,
            remote_state: new.remote_state,
            return_message: new.return_message,
            applied_notifications: BTreeSet::new(),
        }
    }

    /// Amount still available for refund.
    pub fn balance(&self) -> Result<Price> {
        self.amount.checked_sub(&self.refunded_amount)
    }

    pub fn has_applied(&self, notification_key: &str) -> bool {
        self.applied_notifications.contains(notification_key)
    }

    pub fn record_notification(&mut self, notification_key: String) {
        self.applied_notifications.insert(notification_key);
    }
}
