use super::gateway::LiteCheckoutGateway;
use crate::domain::message::ReturnMessage;
use crate::domain::order::CHECKOUT_FLOW;
use crate::domain::payment::{NewPayment, Payment, PaymentState};
use crate::domain::state_machine::PaymentStateMachine;
use crate::error::{PaymentError, Result};
use tracing::{info, warn};

/// Result of handling the customer's return from the hosted page.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnOutcome {
    pub payment: Payment,
    /// Message to show the customer.
    pub message: String,
    /// False when the order already had a payment and the return was a repeat.
    pub created: bool,
}

impl LiteCheckoutGateway {
    /// Creates the order's payment from the synchronous return.
    ///
    /// Every status code maps to a state; only unknown orders, missing checkout
    /// data and storage failures are errors. A repeated return leaves the
    /// payment alone and replays the message of the first one, unless the
    /// payment is already closed, which is a `StateConflict`.
    pub async fn on_return(&self, order_id: &str, message: ReturnMessage) -> Result<ReturnOutcome> {
        let _guard = self.lock_order(order_id).await;

        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("order {}", order_id)))?;
        let checkout = order
            .checkout
            .as_ref()
            .filter(|checkout| checkout.flow == CHECKOUT_FLOW)
            .ok_or_else(|| {
                PaymentError::ValidationError(format!(
                    "Checkout data missing for order {}",
                    order_id
                ))
            })?;

        if let Some(existing) = self.payments.find_by_order(order_id).await? {
            if existing.state.is_terminal() {
                warn!(
                    order_id,
                    payment_id = %existing.id,
                    state = %existing.state,
                    status = %message.status_code,
                    "return rejected: the order's payment is closed"
                );
                return Err(PaymentError::StateConflict {
                    operation: "return",
                    state: existing.state.as_str(),
                });
            }
            warn!(
                order_id,
                payment_id = %existing.id,
                state = %existing.state,
                "repeated return ignored: payment already exists"
            );
            return Ok(ReturnOutcome {
                message: existing.return_message.clone(),
                payment: existing,
                created: false,
            });
        }

        let resolution =
            self.protocol
                .resolve_return(&message.status_code, &message.description, checkout.capture);
        let state = PaymentStateMachine::transition(PaymentState::New, resolution.event)?;
        let payment = self
            .payments
            .create(NewPayment {
                order_id: order.id.clone(),
                amount: order.total_price.clone(),
                state,
                remote_id: message.transaction_id.clone().unwrap_or_default(),
                remote_state: message.status_code.clone(),
                return_message: resolution.message.clone(),
            })
            .await?;

        info!(
            order_id,
            payment_id = %payment.id,
            status = %message.status_code,
            %state,
            "payment created from return"
        );

        Ok(ReturnOutcome {
            payment,
            message: resolution.message,
            created: true,
        })
    }
}
