use super::gateway::{LiteCheckoutGateway, ensure_acknowledged};
use crate::domain::money::Price;
use crate::domain::payment::{Payment, PaymentId};
use crate::domain::state_machine::{PaymentEvent, PaymentStateMachine};
use crate::error::Result;
use tracing::info;

impl LiteCheckoutGateway {
    /// Captures an authorization, by default for the full authorized amount.
    pub async fn capture_payment(&self, id: PaymentId, amount: Option<Price>) -> Result<Payment> {
        let (_guard, mut payment) = self.lock_payment(id).await?;
        let amount = amount.unwrap_or_else(|| payment.amount.clone()).round();
        PaymentStateMachine::check_capture(&payment, &amount)?;

        let response = self.acquirer.capture(&payment, &amount).await?;
        ensure_acknowledged(&response)?;

        PaymentStateMachine::capture(&mut payment, amount)?;
        if let Some(transaction_id) = response.transaction_id {
            payment.remote_id = transaction_id;
        }
        self.payments.save(payment.clone()).await?;

        info!(payment_id = %payment.id, amount = %payment.amount, "payment captured");
        Ok(payment)
    }

    /// Cancels an uncaptured authorization.
    pub async fn void_payment(&self, id: PaymentId) -> Result<Payment> {
        let (_guard, mut payment) = self.lock_payment(id).await?;
        PaymentStateMachine::ensure(&payment, PaymentEvent::Void)?;

        let response = self.acquirer.void(&payment).await?;
        ensure_acknowledged(&response)?;

        PaymentStateMachine::apply(&mut payment, PaymentEvent::Void)?;
        self.payments.save(payment.clone()).await?;

        info!(payment_id = %payment.id, "authorization voided");
        Ok(payment)
    }

    /// Refunds settled funds, by default everything not yet refunded.
    pub async fn refund_payment(&self, id: PaymentId, amount: Option<Price>) -> Result<Payment> {
        let (_guard, mut payment) = self.lock_payment(id).await?;
        let amount = match amount {
            Some(amount) => amount,
            None => payment.balance()?,
        }
        .round();
        let outcome = PaymentStateMachine::plan_refund(&payment, &amount, false)?;

        let response = self
            .acquirer
            .refund(&payment, &amount, outcome.refund_type)
            .await?;
        ensure_acknowledged(&response)?;

        PaymentStateMachine::apply_refund(&mut payment, &outcome, false)?;
        self.payments.save(payment.clone()).await?;

        info!(
            payment_id = %payment.id,
            %amount,
            refund_type = %outcome.refund_type,
            state = %payment.state,
            "payment refunded"
        );
        Ok(payment)
    }
}
