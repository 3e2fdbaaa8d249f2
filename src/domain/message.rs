//! Typed inbound messages.
//!
//! Handlers never read raw request state; transports parse the browser return
//! and the acquirer notification into these structs first.

use super::money::Price;
use super::protocol::GatewayProtocol;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::de::value::{Error as ValueError, MapDeserializer};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::str::FromStr;

fn parse_form(body: &[u8]) -> Result<HashMap<String, String>> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| PaymentError::ValidationError(format!("Malformed form body: {}", e)))
}

/// Synchronous browser return from the hosted payment page.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMessage {
    pub status_code: String,
    pub description: String,
    /// Only present on protocol variants that report the transaction id synchronously.
    pub transaction_id: Option<String>,
}

impl ReturnMessage {
    /// Reads the protocol's return fields. Missing fields read as empty, which
    /// the status table maps like any other unrecognized code.
    pub fn from_fields(fields: &HashMap<String, String>, protocol: &GatewayProtocol) -> Self {
        let read = |key: &str| fields.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            status_code: read(protocol.status_code_field),
            description: read(protocol.status_description_field),
            transaction_id: protocol
                .transaction_id_field
                .map(read)
                .filter(|id| !id.is_empty()),
        }
    }

    pub fn from_form(body: &[u8], protocol: &GatewayProtocol) -> Result<Self> {
        Ok(Self::from_fields(&parse_form(body)?, protocol))
    }
}

/// Payment statuses a notification may legitimately carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyStatus {
    Failed,
    Voided,
    Pending,
    Completed,
    Refunded,
}

const RECOGNIZED_STATUSES: &[(&str, NotifyStatus)] = &[
    ("Failed", NotifyStatus::Failed),
    ("Voided", NotifyStatus::Voided),
    ("Pending", NotifyStatus::Pending),
    ("Completed", NotifyStatus::Completed),
    ("Refunded", NotifyStatus::Refunded),
];

impl FromStr for NotifyStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        RECOGNIZED_STATUSES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, status)| *status)
            .ok_or_else(|| PaymentError::ValidationError(format!("Invalid payment status '{}'", s)))
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

/// Asynchronous acquirer notification.
///
/// Fields are kept raw; status and amount are validated on access so the
/// handler can decide the order in which anomalies are reported.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct NotifyMessage {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub txn_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub parent_txn_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub auth_id: Option<String>,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub mc_gross: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub mc_currency: Option<String>,
    /// Order reference, the consumer order identifier sent on the redirect.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub invoice: Option<String>,
}

impl NotifyMessage {
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self> {
        let deserializer: MapDeserializer<'_, _, ValueError> =
            MapDeserializer::new(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Self::deserialize(deserializer)
            .map_err(|e| PaymentError::ValidationError(format!("Malformed notification: {}", e)))
    }

    pub fn from_form(body: &[u8]) -> Result<Self> {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| PaymentError::ValidationError(format!("Malformed notification: {}", e)))
    }

    pub fn status(&self) -> Result<NotifyStatus> {
        self.payment_status.parse()
    }

    /// Gross amount as a price. A missing currency falls back to `default_currency`.
    pub fn gross(&self, default_currency: &str) -> Result<Option<Price>> {
        let Some(raw) = self.mc_gross.as_deref() else {
            return Ok(None);
        };
        let number = Decimal::from_str(raw)
            .map_err(|_| PaymentError::ValidationError(format!("Invalid gross amount '{}'", raw)))?;
        let currency = self.mc_currency.as_deref().unwrap_or(default_currency);
        Ok(Some(Price::new(number, currency)))
    }

    /// Display reference for logs.
    pub fn order_reference(&self) -> &str {
        self.invoice.as_deref().unwrap_or("unknown")
    }

    /// Redelivery key: the same transaction reported with the same status.
    pub fn dedup_key(&self) -> Option<String> {
        self.txn_id
            .as_ref()
            .map(|txn| format!("{}:{}", txn, self.payment_status))
    }
}
