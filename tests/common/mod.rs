#![allow(dead_code)]

use lite_checkout::application::gateway::LiteCheckoutGateway;
use lite_checkout::application::request::CallbackUrls;
use lite_checkout::config::GatewayConfig;
use lite_checkout::domain::money::Price;
use lite_checkout::domain::order::Order;
use lite_checkout::domain::protocol::ProtocolVariant;
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;

pub const EVENT_HEADER: &str =
    "type, order, amount, currency, status, description, txn_id, parent_txn_id, auth_id";

/// Writes an event log with the standard header followed by `rows`.
pub fn event_file(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", EVENT_HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file.flush().unwrap();
    file
}

/// An in-memory gateway holding one order with a checkout session already built.
pub async fn checked_out_gateway(
    variant: ProtocolVariant,
    order_id: &str,
    total: Decimal,
    capture: bool,
) -> LiteCheckoutGateway {
    let gateway = LiteCheckoutGateway::in_memory(GatewayConfig {
        protocol: variant,
        ..Default::default()
    });
    gateway
        .orders()
        .save(Order::new(order_id, Price::new(total, "ZAR")))
        .await
        .unwrap();
    gateway
        .build_request(
            order_id,
            &CallbackUrls::single("https://shop.test/return"),
            capture,
        )
        .await
        .unwrap();
    gateway
}
