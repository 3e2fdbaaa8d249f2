use super::locks::{KeyGuard, KeyedLocks};
use crate::config::GatewayConfig;
use crate::domain::payment::{Payment, PaymentId};
use crate::domain::ports::{
    Ack, AcquirerClientBox, AcquirerResponse, OrderStoreBox, PaymentStoreBox,
    RedirectTransportBox,
};
use crate::domain::protocol::GatewayProtocol;
use crate::error::{PaymentError, Result};
use crate::infrastructure::acquirer::OfflineAcquirer;
use crate::infrastructure::in_memory::{InMemoryOrderStore, InMemoryPaymentStore};
use crate::infrastructure::redirect::FormRedirectTransport;

/// The offsite payment gateway.
///
/// `LiteCheckoutGateway` owns the collaborators and serializes every
/// read-modify-persist cycle on a payment behind a per-order lock, so the
/// browser return, acquirer notifications and merchant operations for one
/// order never interleave.
pub struct LiteCheckoutGateway {
    pub(crate) config: GatewayConfig,
    pub(crate) protocol: GatewayProtocol,
    pub(crate) orders: OrderStoreBox,
    pub(crate) payments: PaymentStoreBox,
    pub(crate) transport: RedirectTransportBox,
    pub(crate) acquirer: AcquirerClientBox,
    locks: KeyedLocks,
}

impl LiteCheckoutGateway {
    /// Creates a new gateway.
    ///
    /// # Arguments
    ///
    /// * `config` - Credentials, endpoints and protocol variant.
    /// * `orders` - The store for orders.
    /// * `payments` - The store for payments.
    /// * `transport` - Turns redirect payloads into forms.
    /// * `acquirer` - Performs merchant-initiated operations at the acquirer.
    pub fn new(
        config: GatewayConfig,
        orders: OrderStoreBox,
        payments: PaymentStoreBox,
        transport: RedirectTransportBox,
        acquirer: AcquirerClientBox,
    ) -> Self {
        let protocol = config.gateway_protocol();
        Self {
            config,
            protocol,
            orders,
            payments,
            transport,
            acquirer,
            locks: KeyedLocks::new(),
        }
    }

    /// A gateway backed by in-memory stores and the offline acquirer.
    pub fn in_memory(config: GatewayConfig) -> Self {
        Self::new(
            config,
            Box::new(InMemoryOrderStore::new()),
            Box::new(InMemoryPaymentStore::new()),
            Box::new(FormRedirectTransport::new()),
            Box::new(OfflineAcquirer::new()),
        )
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn protocol(&self) -> &GatewayProtocol {
        &self.protocol
    }

    pub fn orders(&self) -> &OrderStoreBox {
        &self.orders
    }

    pub fn payments(&self) -> &PaymentStoreBox {
        &self.payments
    }

    pub(crate) async fn lock_order(&self, order_id: &str) -> KeyGuard {
        self.locks.acquire(order_id).await
    }

    /// Locks the payment's order, then re-reads the payment so the caller
    /// works on the state persisted by whoever held the lock before.
    pub(crate) async fn lock_payment(&self, id: PaymentId) -> Result<(KeyGuard, Payment)> {
        let snapshot = self
            .payments
            .load(id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("payment {}", id)))?;
        let guard = self.lock_order(&snapshot.order_id).await;
        let payment = self
            .payments
            .load(id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("payment {}", id)))?;
        Ok((guard, payment))
    }

    /// Consumes the gateway and returns every stored payment.
    pub async fn into_payments(self) -> Result<Vec<Payment>> {
        self.payments.all().await
    }
}

pub(crate) fn ensure_acknowledged(response: &AcquirerResponse) -> Result<()> {
    match response.ack {
        Ack::Success => Ok(()),
        Ack::Failure => Err(PaymentError::GatewayFailure {
            code: response.error_code.clone(),
            message: response.message.clone(),
        }),
    }
}
