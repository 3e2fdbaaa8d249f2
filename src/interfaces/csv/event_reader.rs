use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// Kind of a row in a gateway event log.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Registers an order with its total.
    Order,
    /// Builds the redirect for an order.
    Checkout,
    /// The customer's browser return.
    Return,
    /// An acquirer notification.
    Notify,
    Capture,
    Void,
    Refund,
}

/// One row of a gateway event log. Columns a type does not use stay empty.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub r#type: EventType,
    pub order: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub txn_id: Option<String>,
    #[serde(default)]
    pub parent_txn_id: Option<String>,
    #[serde(default)]
    pub auth_id: Option<String>,
}

/// Reads gateway events from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<GatewayEvent>`.
/// It trims whitespace and accepts rows that omit trailing empty columns.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes events.
    pub fn events(self) -> impl Iterator<Item = Result<GatewayEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
