use crate::domain::ports::{OrderedFieldMap, RedirectForm, RedirectTransport};
use crate::domain::protocol::SubmissionMethod;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;

/// Packages the redirect payload as a form for the storefront to render.
#[derive(Debug, Default, Clone)]
pub struct FormRedirectTransport;

impl FormRedirectTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RedirectTransport for FormRedirectTransport {
    async fn build_form(
        &self,
        url: &str,
        fields: OrderedFieldMap,
        method: SubmissionMethod,
    ) -> Result<RedirectForm> {
        if url.trim().is_empty() {
            return Err(PaymentError::ConfigError(
                "Redirect endpoint is empty".to_string(),
            ));
        }
        Ok(RedirectForm {
            endpoint: url.to_string(),
            method,
            fields,
        })
    }
}

impl RedirectForm {
    /// Full location for a GET redirect, with the fields as query string.
    pub fn location(&self) -> Result<String> {
        let query = serde_urlencoded::to_string(&self.fields)
            .map_err(|e| PaymentError::InternalError(Box::new(e)))?;
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };
        Ok(format!("{}{}{}", self.endpoint, separator, query))
    }
}
