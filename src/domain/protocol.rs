//! Acquirer protocol capabilities.
//!
//! Both Lite redirect variants share one implementation; what differs between
//! them (submission method, settlement semantics, which return fields exist)
//! is data on [`GatewayProtocol`].

use super::state_machine::PaymentEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubmissionMethod {
    Get,
    Post,
}

impl fmt::Display for SubmissionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionMethod::Get => f.write_str("GET"),
            SubmissionMethod::Post => f.write_str("POST"),
        }
    }
}

/// Customer-facing message attached to a return outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnMessageTemplate {
    Fixed(&'static str),
    /// Wraps the acquirer's status description.
    WithReason {
        prefix: &'static str,
        suffix: &'static str,
    },
}

impl ReturnMessageTemplate {
    pub fn render(&self, description: &str) -> String {
        match self {
            ReturnMessageTemplate::Fixed(message) => (*message).to_string(),
            ReturnMessageTemplate::WithReason { prefix, suffix } => {
                format!("{}{}{}", prefix, description, suffix)
            }
        }
    }
}

/// One row of the return status table. `code: None` is the fallback row.
#[derive(Debug, Clone, Copy)]
pub struct ReturnStatusRule {
    pub code: Option<&'static str>,
    pub event: PaymentEvent,
    pub message: ReturnMessageTemplate,
}

pub const LITE_RETURN_STATUSES: &[ReturnStatusRule] = &[
    ReturnStatusRule {
        code: Some("0"),
        event: PaymentEvent::ReturnSuccess,
        message: ReturnMessageTemplate::Fixed("Success"),
    },
    ReturnStatusRule {
        code: Some("9"),
        event: PaymentEvent::ReturnTechnicalFailure,
        message: ReturnMessageTemplate::Fixed(
            "Transaction failed due to technical problems, please try again later",
        ),
    },
    ReturnStatusRule {
        code: None,
        event: PaymentEvent::ReturnOther,
        message: ReturnMessageTemplate::WithReason {
            prefix: "Transaction failed with reason: \"",
            suffix: "\". Please try again.",
        },
    },
];

/// Outcome of interpreting a return status.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnResolution {
    pub event: PaymentEvent,
    pub message: String,
}

/// Outbound field names shared by the Lite variants.
pub mod fields {
    pub const APPLICATION_ID: &str = "Lite_Merchant_ApplicationId";
    pub const ORDER_AMOUNT: &str = "Lite_Order_Amount";
    pub const CONSUMER_ORDER_ID: &str = "Ecom_ConsumerOrderID";
    pub const SUCCESS_URL: &str = "Lite_Website_Successful_Url";
    pub const FAIL_URL: &str = "Lite_Website_Fail_Url";
    pub const ERROR_URL: &str = "Lite_Website_Error_Url";
    pub const TRY_LATER_URL: &str = "Lite_Website_TryLater_Url";
}

/// Fields the Lite wire format requires even when they carry nothing.
pub const LITE_PLACEHOLDER_FIELDS: &[(&str, &str)] = &[
    ("Lite_Order_Terminal", ""),
    ("Lite_Order_AuthorisationCode", ""),
    ("Lite_Order_BudgetPeriod", ""),
    ("Lite_Website_TextColor", "#000000"),
    ("Lite_Website_BGColor", "#ffffff"),
    ("Lite_AutoInvoice_Ext", ""),
    ("Lite_On_Error_Resume_Next", "true"),
    ("DC_PAYMENT_ID", ""),
    ("DC_TRANSACTION_ID", ""),
    ("Ecom_BillTo_Postal_Name_Prefix", ""),
    ("Ecom_BillTo_Postal_Name_First", ""),
    ("Ecom_BillTo_Postal_Name_Middle", ""),
    ("Ecom_BillTo_Postal_Name_Last", ""),
    ("Ecom_BillTo_Postal_Name_Suffix", ""),
    ("Ecom_BillTo_Postal_Street_Line1", ""),
    ("Ecom_BillTo_Postal_Street_Line2", ""),
    ("Ecom_BillTo_Postal_Street_Line3", ""),
    ("Ecom_BillTo_Postal_City", ""),
    ("Ecom_BillTo_Postal_StateProv", ""),
    ("Ecom_BillTo_Postal_PostalCode", ""),
    ("Ecom_BillTo_Postal_CountryCode", ""),
    ("Ecom_BillTo_Telecom_Phone_Number", ""),
    ("Ecom_BillTo_Online_Email", ""),
    ("Ecom_ShipTo_Postal_Name_Prefix", ""),
    ("Ecom_ShipTo_Postal_Name_First", ""),
    ("Ecom_ShipTo_Postal_Name_Middle", ""),
    ("Ecom_ShipTo_Postal_Name_Last", ""),
    ("Ecom_ShipTo_Postal_Name_Suffix", ""),
    ("Ecom_ShipTo_Postal_Street_Line1", ""),
    ("Ecom_ShipTo_Postal_Street_Line2", ""),
    ("Ecom_ShipTo_Postal_Street_Line3", ""),
    ("Ecom_ShipTo_Postal_City", ""),
    ("Ecom_ShipTo_Postal_StateProv", ""),
    ("Ecom_ShipTo_Postal_PostalCode", ""),
    ("Ecom_ShipTo_Postal_CountryCode", ""),
    ("Ecom_ShipTo_Telecom_Phone_Number", ""),
    ("Ecom_ShipTo_Online_Email", ""),
    ("Ecom_Payment_Card_Name", ""),
    ("Ecom_Payment_Card_Number", ""),
    ("Ecom_Payment_Card_ExpDate_Month", ""),
    ("Ecom_Payment_Card_ExpDate_Year", ""),
    ("Ecom_Payment_Card_Verification", ""),
    ("Ecom_Payment_Card_Protocols", "iVeri"),
    ("Ecom_SchemaVersion", ""),
    ("Ecom_TransactionComplete", "false"),
];

/// Selects one of the built-in protocol capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    #[default]
    LitePost,
    LiteGet,
}

impl ProtocolVariant {
    pub fn protocol(&self) -> GatewayProtocol {
        match self {
            ProtocolVariant::LitePost => GatewayProtocol::lite_post(),
            ProtocolVariant::LiteGet => GatewayProtocol::lite_get(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayProtocol {
    pub name: &'static str,
    pub submission_method: SubmissionMethod,
    /// Whether a successful return means the funds were settled rather than reserved.
    pub immediate_settlement: bool,
    pub status_code_field: &'static str,
    pub status_description_field: &'static str,
    /// Return field carrying the acquirer transaction id, if the variant has one.
    pub transaction_id_field: Option<&'static str>,
    pub consumer_order_prefix: &'static str,
    pub return_statuses: &'static [ReturnStatusRule],
    pub placeholder_fields: &'static [(&'static str, &'static str)],
}

impl GatewayProtocol {
    /// Redirect by POST; the return settles immediately and reports no transaction id.
    pub fn lite_post() -> Self {
        Self {
            name: "lite_post",
            submission_method: SubmissionMethod::Post,
            immediate_settlement: true,
            status_code_field: "LITE_PAYMENT_CARD_STATUS",
            status_description_field: "LITE_RESULT_DESCRIPTION",
            transaction_id_field: None,
            consumer_order_prefix: "Order-",
            return_statuses: LITE_RETURN_STATUSES,
            placeholder_fields: LITE_PLACEHOLDER_FIELDS,
        }
    }

    /// Redirect by GET; the return only authorizes and carries the transaction index.
    pub fn lite_get() -> Self {
        Self {
            name: "lite_get",
            submission_method: SubmissionMethod::Get,
            immediate_settlement: false,
            transaction_id_field: Some("LITE_TRANSACTIONINDEX"),
            ..Self::lite_post()
        }
    }

    /// Maps a return status code to its event and message.
    ///
    /// Total: unknown codes fall through to the table's fallback row. A success
    /// only settles when the protocol and the checkout both ask for capture.
    pub fn resolve_return(&self, code: &str, description: &str, capture: bool) -> ReturnResolution {
        let rule = self
            .return_statuses
            .iter()
            .find(|rule| rule.code == Some(code))
            .or_else(|| self.return_statuses.iter().find(|rule| rule.code.is_none()));

        let Some(rule) = rule else {
            return ReturnResolution {
                event: PaymentEvent::ReturnOther,
                message: description.to_string(),
            };
        };

        let event = match rule.event {
            PaymentEvent::ReturnSuccess if !(self.immediate_settlement && capture) => {
                PaymentEvent::ReturnSuccessAuthorizeOnly
            }
            event => event,
        };

        ReturnResolution {
            event,
            message: rule.message.render(description),
        }
    }

    pub fn consumer_order_id(&self, order_id: &str) -> String {
        format!("{}{}", self.consumer_order_prefix, order_id)
    }

    /// Recovers the order id from a consumer order identifier.
    pub fn order_id_from_reference<'a>(&self, reference: &'a str) -> Option<&'a str> {
        reference
            .strip_prefix(self.consumer_order_prefix)
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_settles_on_post_variant() {
        let resolution = GatewayProtocol::lite_post().resolve_return("0", "", true);
        assert_eq!(resolution.event, PaymentEvent::ReturnSuccess);
        assert_eq!(resolution.message, "Success");
    }

    #[test]
    fn test_success_authorizes_only_without_capture() {
        let protocol = GatewayProtocol::lite_post();
        assert_eq!(
            protocol.resolve_return("0", "", false).event,
            PaymentEvent::ReturnSuccessAuthorizeOnly
        );
        assert_eq!(
            GatewayProtocol::lite_get().resolve_return("0", "", true).event,
            PaymentEvent::ReturnSuccessAuthorizeOnly
        );
    }

    #[test]
    fn test_technical_failure() {
        let resolution = GatewayProtocol::lite_post().resolve_return("9", "ignored", true);
        assert_eq!(resolution.event, PaymentEvent::ReturnTechnicalFailure);
        assert!(resolution.message.contains("technical problems"));
    }

    #[test]
    fn test_unmapped_code_uses_fallback() {
        let resolution = GatewayProtocol::lite_post().resolve_return("3", "card declined", true);
        assert_eq!(resolution.event, PaymentEvent::ReturnOther);
        assert_eq!(
            resolution.message,
            "Transaction failed with reason: \"card declined\". Please try again."
        );
    }

    #[test]
    fn test_status_table_has_single_fallback() {
        let fallbacks = LITE_RETURN_STATUSES
            .iter()
            .filter(|rule| rule.code.is_none())
            .count();
        assert_eq!(fallbacks, 1);
    }

    #[test]
    fn test_consumer_order_reference_roundtrip() {
        let protocol = GatewayProtocol::lite_post();
        let reference = protocol.consumer_order_id("42");
        assert_eq!(reference, "Order-42");
        assert_eq!(protocol.order_id_from_reference(&reference), Some("42"));
        assert_eq!(protocol.order_id_from_reference("Order-"), None);
        assert_eq!(protocol.order_id_from_reference("42"), None);
    }

    #[test]
    fn test_variant_selection() {
        assert_eq!(ProtocolVariant::default().protocol().submission_method, SubmissionMethod::Post);
        assert_eq!(ProtocolVariant::LiteGet.protocol().submission_method, SubmissionMethod::Get);
    }
}
