use super::money::Price;
use serde::{Deserialize, Serialize};

/// Value written into `CheckoutData::flow` by the request builder.
pub const CHECKOUT_FLOW: &str = "iveri_lite";

/// Checkout-session blob stored on the order between redirect and return.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CheckoutData {
    pub flow: String,
    /// Session handle. The Lite protocol issues none, so it stays empty.
    pub token: String,
    pub payer_id: bool,
    /// Whether the customer's payment should settle immediately.
    pub capture: bool,
}

impl CheckoutData {
    pub fn new(capture: bool) -> Self {
        Self {
            flow: CHECKOUT_FLOW.to_string(),
            token: String::new(),
            payer_id: false,
            capture,
        }
    }
}

/// Store order. Referenced by payments, never owned by them.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: String,
    pub total_price: Price,
    #[serde(default)]
    pub checkout: Option<CheckoutData>,
}

impl Order {
    pub fn new(id: impl Into<String>, total_price: Price) -> Self {
        Self {
            id: id.into(),
            total_price,
            checkout: None,
        }
    }
}
