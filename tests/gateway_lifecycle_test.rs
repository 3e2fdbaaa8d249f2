mod common;

use common::checked_out_gateway;
use lite_checkout::domain::message::{NotifyMessage, ReturnMessage};
use lite_checkout::domain::money::Price;
use lite_checkout::domain::payment::PaymentState;
use lite_checkout::domain::protocol::{GatewayProtocol, ProtocolVariant};
use lite_checkout::error::PaymentError;
use lite_checkout::application::notify::NotifyOutcome;
use rust_decimal_macros::dec;

fn lite_return(body: &str, protocol: &GatewayProtocol) -> ReturnMessage {
    ReturnMessage::from_form(body.as_bytes(), protocol).unwrap()
}

#[tokio::test]
async fn test_post_variant_settles_then_refunds_by_notification() {
    let gateway = checked_out_gateway(ProtocolVariant::LitePost, "10", dec!(100.00), true).await;

    let outcome = gateway
        .on_return(
            "10",
            lite_return("LITE_PAYMENT_CARD_STATUS=0", gateway.protocol()),
        )
        .await
        .unwrap();
    assert_eq!(outcome.payment.state, PaymentState::Completed);
    assert_eq!(outcome.payment.remote_id, "");

    // The first refund notice adopts the payment through the order reference.
    let refund = NotifyMessage::from_form(
        b"txn_id=RF-1&parent_txn_id=TX-10&payment_status=Refunded&mc_gross=-30.00&mc_currency=ZAR&invoice=Order-10",
    )
    .unwrap();
    assert_eq!(gateway.on_notify(refund).await.unwrap(), NotifyOutcome::Applied);

    let payment = gateway.payments().find_by_order("10").await.unwrap().unwrap();
    assert_eq!(payment.state, PaymentState::PartiallyRefunded);
    assert_eq!(payment.refunded_amount, Price::new(dec!(30.00), "ZAR"));

    let rest = gateway.refund_payment(payment.id, None).await.unwrap();
    assert_eq!(rest.state, PaymentState::Refunded);
    assert_eq!(rest.refunded_amount.number, dec!(100.00));

    let again = gateway
        .refund_payment(payment.id, Some(Price::new(dec!(1.00), "ZAR")))
        .await;
    assert!(matches!(again, Err(PaymentError::RefundExceedsBalance { .. })));
}

#[tokio::test]
async fn test_get_variant_authorizes_then_captures() {
    let gateway = checked_out_gateway(ProtocolVariant::LiteGet, "11", dec!(80.00), true).await;

    let outcome = gateway
        .on_return(
            "11",
            lite_return(
                "LITE_PAYMENT_CARD_STATUS=0&LITE_TRANSACTIONINDEX=TX-11",
                gateway.protocol(),
            ),
        )
        .await
        .unwrap();
    assert_eq!(outcome.payment.state, PaymentState::Authorization);
    assert_eq!(outcome.payment.remote_id, "TX-11");

    let pending = NotifyMessage::from_form(
        b"txn_id=TX-11&auth_id=TX-11&payment_status=Pending&invoice=Order-11",
    )
    .unwrap();
    assert_eq!(gateway.on_notify(pending).await.unwrap(), NotifyOutcome::Applied);

    let captured = gateway
        .capture_payment(outcome.payment.id, Some(Price::new(dec!(79.995), "ZAR")))
        .await
        .unwrap();
    assert_eq!(captured.state, PaymentState::Completed);
    assert_eq!(captured.amount.number, dec!(80.00));

    assert!(matches!(
        gateway.void_payment(captured.id).await,
        Err(PaymentError::StateConflict { .. })
    ));
}

#[tokio::test]
async fn test_authorization_voided_by_notification() {
    let gateway = checked_out_gateway(ProtocolVariant::LitePost, "12", dec!(20.00), false).await;

    let outcome = gateway
        .on_return(
            "12",
            lite_return("LITE_PAYMENT_CARD_STATUS=0", gateway.protocol()),
        )
        .await
        .unwrap();
    assert_eq!(outcome.payment.state, PaymentState::Authorization);

    let voided = NotifyMessage::from_form(
        b"txn_id=TX-12&auth_id=AUTH-12&payment_status=Voided&invoice=Order-12",
    )
    .unwrap();
    assert_eq!(gateway.on_notify(voided).await.unwrap(), NotifyOutcome::Applied);

    let payment = gateway.payments().find_by_remote_id("TX-12").await.unwrap().unwrap();
    assert_eq!(payment.state, PaymentState::AuthorizationVoided);
    assert_eq!(payment.remote_state, "Voided");

    let late = NotifyMessage::from_form(
        b"txn_id=TX-12&auth_id=AUTH-12&payment_status=Completed&invoice=Order-12",
    )
    .unwrap();
    assert_eq!(
        gateway.on_notify(late).await.unwrap(),
        NotifyOutcome::IgnoredStateConflict
    );
}

#[tokio::test]
async fn test_declined_return_keeps_reason() {
    let gateway = checked_out_gateway(ProtocolVariant::LitePost, "13", dec!(5.00), true).await;

    let outcome = gateway
        .on_return(
            "13",
            lite_return(
                "LITE_PAYMENT_CARD_STATUS=2&LITE_RESULT_DESCRIPTION=Insufficient+funds",
                gateway.protocol(),
            ),
        )
        .await
        .unwrap();
    assert_eq!(outcome.payment.state, PaymentState::Authorization);
    assert!(outcome.message.contains("Insufficient funds"));
}
