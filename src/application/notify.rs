use super::gateway::LiteCheckoutGateway;
use crate::domain::message::{NotifyMessage, NotifyStatus};
use crate::domain::money::Price;
use crate::domain::payment::{Payment, PaymentState};
use crate::domain::state_machine::{PaymentEvent, PaymentStateMachine};
use crate::error::{PaymentError, Result};
use tracing::{error, info, warn};

/// What the notification handler did with a notification.
///
/// Everything but `Applied` leaves the store untouched. The endpoint should
/// acknowledge all of them so the acquirer stops redelivering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Applied,
    /// No transaction id: not a payment event.
    IgnoredNoTransactionId,
    /// The acquirer reported a failed transaction; nothing to reconcile.
    IgnoredFailed,
    IgnoredNoMatchingPayment,
    IgnoredAlreadyRefunded,
    /// Settled by the synchronous return.
    IgnoredHandledInline,
    /// Redelivery of a notification already applied.
    IgnoredDuplicate,
    /// The payment's state does not accept this notification.
    IgnoredStateConflict,
    /// The reconciler refused the notified refund amount.
    IgnoredRefundRejected,
    /// The gross amount is unparsable, or missing on a refund.
    IgnoredMalformedAmount,
}

/// How a notification was joined to its payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Located {
    ByRemoteId,
    /// Adopted through the order reference while the payment had no remote id.
    ByOrderReference,
}

impl NotifyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, NotifyOutcome::Applied)
    }
}

impl LiteCheckoutGateway {
    /// Reconciles an asynchronous acquirer notification with the stored payment.
    ///
    /// Only an unrecognized payment status is an error; every other anomaly is
    /// logged and reported as an `Ignored*` outcome.
    pub async fn on_notify(&self, message: NotifyMessage) -> Result<NotifyOutcome> {
        let Some(txn_id) = message.txn_id.as_deref() else {
            error!(
                order = message.order_reference(),
                "notification has no transaction id, ignored"
            );
            return Ok(NotifyOutcome::IgnoredNoTransactionId);
        };

        let status = message.status()?;
        match status {
            NotifyStatus::Voided | NotifyStatus::Pending | NotifyStatus::Completed
                if message.auth_id.is_some() =>
            {
                self.apply_authorization_notice(&message, status, txn_id).await
            }
            NotifyStatus::Refunded => self.apply_refund_notice(&message).await,
            NotifyStatus::Failed => {
                info!(
                    order = message.order_reference(),
                    txn_id, "failure notification has no handling, ignored"
                );
                Ok(NotifyOutcome::IgnoredFailed)
            }
            _ => {
                info!(
                    order = message.order_reference(),
                    txn_id,
                    status = %message.payment_status,
                    "notification ignored: accommodated by the return"
                );
                Ok(NotifyOutcome::IgnoredHandledInline)
            }
        }
    }

    async fn apply_authorization_notice(
        &self,
        message: &NotifyMessage,
        status: NotifyStatus,
        txn_id: &str,
    ) -> Result<NotifyOutcome> {
        let Some(event) = PaymentEvent::for_notification(status) else {
            return Ok(NotifyOutcome::IgnoredHandledInline);
        };
        let amount = match message.gross(&self.config.currency) {
            Ok(amount) => amount,
            Err(e) => return Ok(malformed_amount(message, &e)),
        };

        // A redelivery finds the payment under the id the first delivery wrote.
        let ids = [message.auth_id.as_deref(), Some(txn_id)];
        let Some((found, located)) = self.locate_payment(&ids, message).await? else {
            warn!(
                order = message.order_reference(),
                "notification ignored: no authorization to update"
            );
            return Ok(NotifyOutcome::IgnoredNoMatchingPayment);
        };

        let (_guard, mut payment) = self.lock_payment(found.id).await?;
        if !still_matches(&payment, located, &ids) {
            warn!(
                payment_id = %payment.id,
                remote_id = %payment.remote_id,
                "notification ignored: payment adopted by another transaction"
            );
            return Ok(NotifyOutcome::IgnoredNoMatchingPayment);
        }
        let key = message.dedup_key().unwrap_or_default();
        if payment.has_applied(&key) {
            warn!(payment_id = %payment.id, key = %key, "notification already applied, ignored");
            return Ok(NotifyOutcome::IgnoredDuplicate);
        }
        if let Err(e) = PaymentStateMachine::ensure(&payment, event) {
            warn!(payment_id = %payment.id, error = %e, "notification ignored");
            return Ok(NotifyOutcome::IgnoredStateConflict);
        }

        if let Some(amount) = amount.filter(Price::is_positive) {
            payment.refunded_amount = Price::zero(amount.currency.clone());
            payment.amount = amount;
        }
        PaymentStateMachine::apply(&mut payment, event)?;
        payment.remote_id = txn_id.to_string();

        self.persist_notified(payment, message, key).await
    }

    async fn apply_refund_notice(&self, message: &NotifyMessage) -> Result<NotifyOutcome> {
        let Some(parent_txn_id) = message.parent_txn_id.as_deref() else {
            warn!(
                order = message.order_reference(),
                "notification ignored: refund names no parent transaction"
            );
            return Ok(NotifyOutcome::IgnoredNoMatchingPayment);
        };
        let ids = [Some(parent_txn_id)];
        let Some((found, located)) = self.locate_payment(&ids, message).await? else {
            warn!(
                order = message.order_reference(),
                parent_txn_id,
                "notification ignored: the transaction to be refunded does not exist"
            );
            return Ok(NotifyOutcome::IgnoredNoMatchingPayment);
        };

        let (_guard, mut payment) = self.lock_payment(found.id).await?;
        if !still_matches(&payment, located, &ids) {
            warn!(
                payment_id = %payment.id,
                remote_id = %payment.remote_id,
                parent_txn_id,
                "refund notification ignored: payment adopted by another transaction"
            );
            return Ok(NotifyOutcome::IgnoredNoMatchingPayment);
        }
        if payment.state == PaymentState::Refunded {
            warn!(
                order = message.order_reference(),
                payment_id = %payment.id,
                "notification ignored: the transaction is already refunded"
            );
            return Ok(NotifyOutcome::IgnoredAlreadyRefunded);
        }
        let key = message.dedup_key().unwrap_or_default();
        if payment.has_applied(&key) {
            warn!(payment_id = %payment.id, key = %key, "refund notification already applied, ignored");
            return Ok(NotifyOutcome::IgnoredDuplicate);
        }

        // Acquirers report refunds with a negative gross.
        let amount = match message.gross(&payment.amount.currency) {
            Ok(Some(gross)) => Price::new(gross.number.abs(), gross.currency),
            Ok(None) => {
                let e =
                    PaymentError::ValidationError("Refund notification has no amount".to_string());
                return Ok(malformed_amount(message, &e));
            }
            Err(e) => return Ok(malformed_amount(message, &e)),
        };

        let outcome = match PaymentStateMachine::plan_refund(&payment, &amount, true) {
            Ok(outcome) => outcome,
            Err(e @ PaymentError::StateConflict { .. }) => {
                warn!(payment_id = %payment.id, error = %e, "refund notification ignored");
                return Ok(NotifyOutcome::IgnoredStateConflict);
            }
            Err(e) => {
                error!(payment_id = %payment.id, error = %e, "refund notification rejected");
                return Ok(NotifyOutcome::IgnoredRefundRejected);
            }
        };
        PaymentStateMachine::apply_refund(&mut payment, &outcome, true)?;
        if payment.remote_id.is_empty() {
            // Later refunds must name the same parent.
            payment.remote_id = parent_txn_id.to_string();
        }
        info!(
            payment_id = %payment.id,
            refund_type = %outcome.refund_type,
            refunded = %payment.refunded_amount,
            "notified refund applied"
        );

        self.persist_notified(payment, message, key).await
    }

    /// Finds the payment by the first matching remote id. Failing that, a
    /// payment of the referenced order is adopted while it has no remote id,
    /// which is the case for protocol variants that report none on return.
    async fn locate_payment(
        &self,
        remote_ids: &[Option<&str>],
        message: &NotifyMessage,
    ) -> Result<Option<(Payment, Located)>> {
        for remote_id in remote_ids.iter().flatten() {
            if let Some(payment) = self.payments.find_by_remote_id(remote_id).await? {
                return Ok(Some((payment, Located::ByRemoteId)));
            }
        }

        let Some(order_id) = message
            .invoice
            .as_deref()
            .and_then(|reference| self.protocol.order_id_from_reference(reference))
        else {
            return Ok(None);
        };
        Ok(self
            .payments
            .find_by_order(order_id)
            .await?
            .filter(|payment| payment.remote_id.is_empty())
            .map(|payment| (payment, Located::ByOrderReference)))
    }

    async fn persist_notified(
        &self,
        mut payment: Payment,
        message: &NotifyMessage,
        key: String,
    ) -> Result<NotifyOutcome> {
        payment.remote_state = message.payment_status.clone();
        payment.record_notification(key);
        info!(
            payment_id = %payment.id,
            remote_id = %payment.remote_id,
            state = %payment.state,
            "notification applied"
        );
        self.payments.save(payment).await?;
        Ok(NotifyOutcome::Applied)
    }
}

/// An adopted payment is only still ours if no other transaction claimed it
/// between the lookup and the lock.
fn still_matches(payment: &Payment, located: Located, remote_ids: &[Option<&str>]) -> bool {
    located == Located::ByRemoteId
        || payment.remote_id.is_empty()
        || remote_ids.iter().flatten().any(|id| *id == payment.remote_id)
}

fn malformed_amount(message: &NotifyMessage, e: &PaymentError) -> NotifyOutcome {
    warn!(
        order = message.order_reference(),
        txn_id = message.txn_id.as_deref().unwrap_or_default(),
        error = %e,
        "notification ignored: malformed amount"
    );
    NotifyOutcome::IgnoredMalformedAmount
}
