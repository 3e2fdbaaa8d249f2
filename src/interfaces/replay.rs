//! Drives a `LiteCheckoutGateway` from an event log.
//!
//! Each row is translated into the same inbound message a live transport
//! would produce, so a replay goes through the real handlers.

use super::csv::event_reader::{EventType, GatewayEvent};
use crate::application::gateway::LiteCheckoutGateway;
use crate::application::request::CallbackUrls;
use crate::domain::message::{NotifyMessage, ReturnMessage};
use crate::domain::money::Price;
use crate::domain::order::Order;
use crate::domain::payment::Payment;
use crate::error::{PaymentError, Result};
use std::collections::HashMap;
use tracing::{debug, info};

/// `status` value on a checkout row that asks for authorization only.
pub const AUTHORIZE_ONLY: &str = "authorize";

/// Callback used when a checkout row names none in `description`.
pub const DEFAULT_RETURN_URL: &str = "http://localhost/checkout/return";

pub async fn replay_event(gateway: &LiteCheckoutGateway, event: GatewayEvent) -> Result<()> {
    match event.r#type {
        EventType::Order => {
            let total = event_price(gateway, &event).ok_or_else(|| {
                PaymentError::ValidationError(format!("order {} has no amount", event.order))
            })?;
            gateway.orders().save(Order::new(event.order, total)).await
        }
        EventType::Checkout => {
            let capture = event.status.as_deref() != Some(AUTHORIZE_ONLY);
            let url = event.description.as_deref().unwrap_or(DEFAULT_RETURN_URL);
            let form = gateway
                .redirect_form(&event.order, &CallbackUrls::single(url), capture)
                .await?;
            let location = form.location()?;
            debug!(order_id = %event.order, %location, "redirect built");
            Ok(())
        }
        EventType::Return => {
            let protocol = gateway.protocol();
            let mut fields = HashMap::new();
            put(&mut fields, protocol.status_code_field, &event.status);
            put(&mut fields, protocol.status_description_field, &event.description);
            if let Some(field) = protocol.transaction_id_field {
                put(&mut fields, field, &event.txn_id);
            }
            let outcome = gateway
                .on_return(&event.order, ReturnMessage::from_fields(&fields, protocol))
                .await?;
            info!(order_id = %event.order, message = %outcome.message, "customer returned");
            Ok(())
        }
        EventType::Notify => {
            let mut fields = HashMap::new();
            put(&mut fields, "txn_id", &event.txn_id);
            put(&mut fields, "parent_txn_id", &event.parent_txn_id);
            put(&mut fields, "auth_id", &event.auth_id);
            put(&mut fields, "payment_status", &event.status);
            put(&mut fields, "mc_gross", &event.amount.map(|a| a.to_string()));
            put(&mut fields, "mc_currency", &event.currency);
            fields.insert(
                "invoice".to_string(),
                gateway.protocol().consumer_order_id(&event.order),
            );
            let outcome = gateway.on_notify(NotifyMessage::from_fields(&fields)?).await?;
            info!(order_id = %event.order, ?outcome, "notification handled");
            Ok(())
        }
        EventType::Capture => {
            let payment = order_payment(gateway, &event.order).await?;
            let amount = event_price(gateway, &event);
            gateway.capture_payment(payment.id, amount).await.map(drop)
        }
        EventType::Void => {
            let payment = order_payment(gateway, &event.order).await?;
            gateway.void_payment(payment.id).await.map(drop)
        }
        EventType::Refund => {
            let payment = order_payment(gateway, &event.order).await?;
            let amount = event_price(gateway, &event);
            gateway.refund_payment(payment.id, amount).await.map(drop)
        }
    }
}

fn put(fields: &mut HashMap<String, String>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), value.clone());
    }
}

/// The row's amount, in the row's currency or the gateway's default.
fn event_price(gateway: &LiteCheckoutGateway, event: &GatewayEvent) -> Option<Price> {
    event.amount.map(|number| {
        let currency = event
            .currency
            .clone()
            .unwrap_or_else(|| gateway.config().currency.clone());
        Price::new(number, currency)
    })
}

async fn order_payment(gateway: &LiteCheckoutGateway, order_id: &str) -> Result<Payment> {
    gateway
        .payments()
        .find_by_order(order_id)
        .await?
        .ok_or_else(|| PaymentError::NotFound(format!("payment for order {}", order_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::domain::payment::PaymentState;
    use crate::interfaces::csv::event_reader::EventReader;
    use rust_decimal_macros::dec;

    async fn replay(gateway: &LiteCheckoutGateway, rows: &str) -> Vec<Result<()>> {
        let data = format!(
            "type, order, amount, currency, status, description, txn_id, parent_txn_id, auth_id\n{}",
            rows
        );
        let mut results = Vec::new();
        for event in EventReader::new(data.as_bytes()).events() {
            results.push(replay_event(gateway, event.unwrap()).await);
        }
        results
    }

    #[tokio::test]
    async fn test_replay_full_lifecycle() {
        let gateway = LiteCheckoutGateway::in_memory(GatewayConfig::default());
        let results = replay(
            &gateway,
            "order, 1, 100.00, ZAR\n\
             checkout, 1, , , authorize\n\
             return, 1, , , 0\n\
             notify, 1, 100.00, ZAR, Completed, , TX-1, , TX-1\n\
             refund, 1, 40.00\n",
        )
        .await;
        assert!(results.iter().all(Result::is_ok));

        let payment = gateway.payments().find_by_order("1").await.unwrap().unwrap();
        assert_eq!(payment.state, PaymentState::PartiallyRefunded);
        assert_eq!(payment.remote_id, "TX-1");
        assert_eq!(payment.refunded_amount.number, dec!(40.00));
    }

    #[tokio::test]
    async fn test_replay_authorize_only_then_capture() {
        let gateway = LiteCheckoutGateway::in_memory(GatewayConfig::default());
        let results = replay(
            &gateway,
            "order, 2, 50.00\n\
             checkout, 2, , , authorize\n\
             return, 2, , , 0\n\
             capture, 2, 45.00\n",
        )
        .await;
        assert!(results.iter().all(Result::is_ok));

        let payment = gateway.payments().find_by_order("2").await.unwrap().unwrap();
        assert_eq!(payment.state, PaymentState::Completed);
        assert_eq!(payment.amount, Price::new(dec!(45.00), "ZAR"));
    }

    #[tokio::test]
    async fn test_replay_row_errors_do_not_stop_later_rows() {
        let gateway = LiteCheckoutGateway::in_memory(GatewayConfig::default());
        let results = replay(
            &gateway,
            "order, 3\n\
             void, 3\n\
             order, 4, 10.00\n",
        )
        .await;
        assert!(matches!(results[0], Err(PaymentError::ValidationError(_))));
        assert!(matches!(results[1], Err(PaymentError::NotFound(_))));
        assert!(results[2].is_ok());
    }
}
