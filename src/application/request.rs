use super::gateway::LiteCheckoutGateway;
use crate::config::GatewayConfig;
use crate::domain::order::{CheckoutData, Order};
use crate::domain::ports::{OrderedFieldMap, RedirectForm};
use crate::domain::protocol::{GatewayProtocol, fields};
use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where the acquirer sends the customer back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackUrls {
    pub success: String,
    pub fail: String,
    pub error: String,
    pub try_later: String,
}

impl CallbackUrls {
    /// All four outcomes share one return endpoint.
    pub fn single(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            success: url.clone(),
            fail: url.clone(),
            error: url.clone(),
            try_later: url,
        }
    }
}

/// Builds the outbound submission for an order, in wire order.
pub fn build_redirect_fields(
    order: &Order,
    config: &GatewayConfig,
    protocol: &GatewayProtocol,
    urls: &CallbackUrls,
) -> OrderedFieldMap {
    let mut map = OrderedFieldMap::new();
    let mut put = |key: &str, value: &str| {
        map.insert(key.to_string(), value.to_string());
    };

    put(fields::APPLICATION_ID, config.application_key());
    put(
        fields::ORDER_AMOUNT,
        &format!("{:.2}", order.total_price.round().number),
    );
    put(fields::CONSUMER_ORDER_ID, &protocol.consumer_order_id(&order.id));
    put(fields::SUCCESS_URL, &urls.success);
    put(fields::FAIL_URL, &urls.fail);
    put(fields::ERROR_URL, &urls.error);
    put(fields::TRY_LATER_URL, &urls.try_later);
    for &(key, value) in protocol.placeholder_fields {
        put(key, value);
    }

    map
}

impl LiteCheckoutGateway {
    /// Records the checkout session on the order and returns the redirect payload.
    pub async fn build_request(
        &self,
        order_id: &str,
        urls: &CallbackUrls,
        capture: bool,
    ) -> Result<OrderedFieldMap> {
        let _guard = self.lock_order(order_id).await;
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or_else(|| PaymentError::NotFound(format!("order {}", order_id)))?;

        order.checkout = Some(CheckoutData::new(capture));
        let fields = build_redirect_fields(&order, &self.config, &self.protocol, urls);
        self.orders.save(order).await?;

        info!(order_id, protocol = self.protocol.name, capture, "checkout redirect prepared");
        Ok(fields)
    }

    /// Like [`build_request`](Self::build_request), packaged by the redirect transport.
    pub async fn redirect_form(
        &self,
        order_id: &str,
        urls: &CallbackUrls,
        capture: bool,
    ) -> Result<RedirectForm> {
        let fields = self.build_request(order_id, urls, capture).await?;
        self.transport
            .build_form(
                &self.config.submission_endpoint,
                fields,
                self.protocol.submission_method,
            )
            .await
    }
}
