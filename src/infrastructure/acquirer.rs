use crate::domain::money::Price;
use crate::domain::payment::Payment;
use crate::domain::ports::{AcquirerClient, AcquirerResponse};
use crate::domain::refund::RefundType;
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Acquirer client that acknowledges every operation without a network call.
///
/// Used by the replay binary and in tests. Captures keep the payment's remote id.
#[derive(Debug, Default, Clone)]
pub struct OfflineAcquirer;

impl OfflineAcquirer {
    pub fn new() -> Self {
        Self
    }
}

fn existing_remote_id(payment: &Payment) -> Option<String> {
    Some(payment.remote_id.clone()).filter(|id| !id.is_empty())
}

#[async_trait]
impl AcquirerClient for OfflineAcquirer {
    async fn capture(&self, payment: &Payment, amount: &Price) -> Result<AcquirerResponse> {
        debug!(payment_id = %payment.id, %amount, "offline capture acknowledged");
        Ok(AcquirerResponse::success(existing_remote_id(payment)))
    }

    async fn void(&self, payment: &Payment) -> Result<AcquirerResponse> {
        debug!(payment_id = %payment.id, "offline void acknowledged");
        Ok(AcquirerResponse::success(None))
    }

    async fn refund(
        &self,
        payment: &Payment,
        amount: &Price,
        refund_type: RefundType,
    ) -> Result<AcquirerResponse> {
        debug!(payment_id = %payment.id, %amount, %refund_type, "offline refund acknowledged");
        Ok(AcquirerResponse::success(None))
    }
}
