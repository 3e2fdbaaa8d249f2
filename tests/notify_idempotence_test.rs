mod common;

use common::checked_out_gateway;
use lite_checkout::application::notify::NotifyOutcome;
use lite_checkout::domain::message::{NotifyMessage, ReturnMessage};
use lite_checkout::domain::payment::PaymentState;
use lite_checkout::domain::protocol::ProtocolVariant;
use lite_checkout::error::PaymentError;
use rust_decimal_macros::dec;
use std::collections::HashMap;

fn notice(pairs: &[(&str, &str)]) -> NotifyMessage {
    let fields: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    NotifyMessage::from_fields(&fields).unwrap()
}

async fn completed_gateway() -> lite_checkout::application::gateway::LiteCheckoutGateway {
    let gateway = checked_out_gateway(ProtocolVariant::LiteGet, "1", dec!(100.00), true).await;
    gateway
        .on_return(
            "1",
            ReturnMessage {
                status_code: "0".to_string(),
                description: String::new(),
                transaction_id: Some("TX-1".to_string()),
            },
        )
        .await
        .unwrap();
    let completed = notice(&[
        ("txn_id", "TX-1"),
        ("auth_id", "TX-1"),
        ("payment_status", "Completed"),
        ("mc_gross", "100.00"),
    ]);
    assert_eq!(gateway.on_notify(completed).await.unwrap(), NotifyOutcome::Applied);
    gateway
}

#[tokio::test]
async fn test_redelivered_refund_applies_once() {
    let gateway = completed_gateway().await;
    let refund = notice(&[
        ("txn_id", "RF-1"),
        ("parent_txn_id", "TX-1"),
        ("payment_status", "Refunded"),
        ("mc_gross", "-40.00"),
    ]);

    assert_eq!(gateway.on_notify(refund.clone()).await.unwrap(), NotifyOutcome::Applied);
    assert_eq!(
        gateway.on_notify(refund).await.unwrap(),
        NotifyOutcome::IgnoredDuplicate
    );

    let payment = gateway.payments().find_by_remote_id("TX-1").await.unwrap().unwrap();
    assert_eq!(payment.state, PaymentState::PartiallyRefunded);
    assert_eq!(payment.refunded_amount.number, dec!(40.00));
}

#[tokio::test]
async fn test_refund_notice_after_full_refund() {
    let gateway = completed_gateway().await;
    let full = notice(&[
        ("txn_id", "RF-1"),
        ("parent_txn_id", "TX-1"),
        ("payment_status", "Refunded"),
        ("mc_gross", "-100.00"),
    ]);
    assert_eq!(gateway.on_notify(full).await.unwrap(), NotifyOutcome::Applied);

    let another = notice(&[
        ("txn_id", "RF-2"),
        ("parent_txn_id", "TX-1"),
        ("payment_status", "Refunded"),
        ("mc_gross", "-1.00"),
    ]);
    assert_eq!(
        gateway.on_notify(another).await.unwrap(),
        NotifyOutcome::IgnoredAlreadyRefunded
    );
}

#[tokio::test]
async fn test_oversized_refund_notice_rejected() {
    let gateway = completed_gateway().await;
    let refund = notice(&[
        ("txn_id", "RF-1"),
        ("parent_txn_id", "TX-1"),
        ("payment_status", "Refunded"),
        ("mc_gross", "-150.00"),
    ]);
    assert_eq!(
        gateway.on_notify(refund).await.unwrap(),
        NotifyOutcome::IgnoredRefundRejected
    );

    let payment = gateway.payments().find_by_remote_id("TX-1").await.unwrap().unwrap();
    assert_eq!(payment.state, PaymentState::Completed);
    assert!(payment.refunded_amount.is_zero());
}

#[tokio::test]
async fn test_unknown_parent_and_unknown_status() {
    let gateway = completed_gateway().await;

    let orphan = notice(&[
        ("txn_id", "RF-9"),
        ("parent_txn_id", "TX-404"),
        ("payment_status", "Refunded"),
        ("mc_gross", "-1.00"),
    ]);
    assert_eq!(
        gateway.on_notify(orphan).await.unwrap(),
        NotifyOutcome::IgnoredNoMatchingPayment
    );

    let reversed = notice(&[("txn_id", "TX-1"), ("payment_status", "Reversed")]);
    assert!(matches!(
        gateway.on_notify(reversed).await,
        Err(PaymentError::ValidationError(_))
    ));
}
