use crate::domain::order::Order;
use crate::domain::payment::{NewPayment, Payment, PaymentId};
use crate::domain::ports::{OrderStore, PaymentStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for orders.
///
/// Uses `Arc<RwLock<HashMap<String, Order>>>` to allow shared concurrent access.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(order_id).cloned())
    }

    async fn save(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id.clone(), order);
        Ok(())
    }
}

/// A thread-safe in-memory store for payments.
///
/// Remote ids are unique once set: saving a payment whose remote id is already
/// held by another payment fails.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<PaymentId, Payment>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_remote_id_free(payments: &HashMap<PaymentId, Payment>, payment: &Payment) -> Result<()> {
    if payment.remote_id.is_empty() {
        return Ok(());
    }
    let taken = payments
        .values()
        .any(|other| other.id != payment.id && other.remote_id == payment.remote_id);
    if taken {
        Err(PaymentError::ValidationError(format!(
            "Remote id '{}' already belongs to another payment",
            payment.remote_id
        )))
    } else {
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, fields: NewPayment) -> Result<Payment> {
        let payment = Payment::from_new(PaymentId::generate(), fields);
        let mut payments = self.payments.write().await;
        ensure_remote_id_free(&payments, &payment)?;
        payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn save(&self, payment: Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        ensure_remote_id_free(&payments, &payment)?;
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn load(&self, id: PaymentId) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Payment>> {
        if remote_id.is_empty() {
            return Ok(None);
        }
        let payments = self.payments.read().await;
        Ok(payments.values().find(|p| p.remote_id == remote_id).cloned())
    }

    async fn find_by_order(&self, order_id: &str) -> Result<Option<Payment>> {
        let payments = self.payments.read().await;
        Ok(payments.values().find(|p| p.order_id == order_id).cloned())
    }

    async fn all(&self) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut all: Vec<Payment> = payments.values().cloned().collect();
        all.sort_by(|a, b| a.order_id.cmp(&b.order_id).then(a.id.cmp(&b.id)));
        Ok(all)
    }
}
