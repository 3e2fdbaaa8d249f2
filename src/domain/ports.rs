use super::money::Price;
use super::order::Order;
use super::payment::{NewPayment, Payment, PaymentId};
use super::protocol::SubmissionMethod;
use super::refund::RefundType;
use crate::error::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;

/// Outbound redirect payload, in wire order.
pub type OrderedFieldMap = IndexMap<String, String>;

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, order_id: &str) -> Result<Option<Order>>;
    async fn save(&self, order: Order) -> Result<()>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persists a new payment and assigns its id.
    async fn create(&self, fields: NewPayment) -> Result<Payment>;
    async fn save(&self, payment: Payment) -> Result<()>;
    async fn load(&self, id: PaymentId) -> Result<Option<Payment>>;
    async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Payment>>;
    async fn find_by_order(&self, order_id: &str) -> Result<Option<Payment>>;
    async fn all(&self) -> Result<Vec<Payment>>;
}

/// A ready-to-render redirect to the hosted payment page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectForm {
    pub endpoint: String,
    pub method: SubmissionMethod,
    pub fields: OrderedFieldMap,
}

#[async_trait]
pub trait RedirectTransport: Send + Sync {
    async fn build_form(
        &self,
        url: &str,
        fields: OrderedFieldMap,
        method: SubmissionMethod,
    ) -> Result<RedirectForm>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Success,
    Failure,
}

/// The acquirer's acknowledgement of a merchant-initiated operation.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquirerResponse {
    pub ack: Ack,
    /// New transaction id issued for the operation, if any.
    pub transaction_id: Option<String>,
    pub error_code: String,
    pub message: String,
}

impl AcquirerResponse {
    pub fn success(transaction_id: Option<String>) -> Self {
        Self {
            ack: Ack::Success,
            transaction_id,
            error_code: String::new(),
            message: String::new(),
        }
    }

    pub fn failure(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ack: Ack::Failure,
            transaction_id: None,
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait AcquirerClient: Send + Sync {
    async fn capture(&self, payment: &Payment, amount: &Price) -> Result<AcquirerResponse>;
    async fn void(&self, payment: &Payment) -> Result<AcquirerResponse>;
    async fn refund(
        &self,
        payment: &Payment,
        amount: &Price,
        refund_type: RefundType,
    ) -> Result<AcquirerResponse>;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type RedirectTransportBox = Box<dyn RedirectTransport>;
pub type AcquirerClientBox = Box<dyn AcquirerClient>;
