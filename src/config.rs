use crate::domain::protocol::{GatewayProtocol, ProtocolVariant};
use crate::error::{PaymentError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const LITE_SUBMISSION_ENDPOINT: &str =
    "https://backoffice.nedsecure.co.za/Lite/Transactions/New/EasyAuthorise.aspx";
pub const LITE_AUTH_INFO_ENDPOINT: &str =
    "https://backoffice.iveri.co.za/Lite/Transactions/New/AuthoriseInfo.aspx";
pub const DEFAULT_CURRENCY: &str = "ZAR";
pub const VALIDATION_SECRET_LENGTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    #[default]
    Test,
    Live,
}

/// Gateway settings, normally loaded from a JSON file.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub test_key: String,
    pub live_key: String,
    pub transaction_mode: TransactionMode,
    pub submission_endpoint: String,
    pub auth_info_endpoint: String,
    /// Secret meant for validating redirect responses. Nothing checks it yet:
    /// the acquirer's signing scheme is unspecified.
    pub validation_secret: String,
    pub protocol: ProtocolVariant,
    pub currency: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            test_key: String::new(),
            live_key: String::new(),
            transaction_mode: TransactionMode::Test,
            submission_endpoint: LITE_SUBMISSION_ENDPOINT.to_string(),
            auth_info_endpoint: LITE_AUTH_INFO_ENDPOINT.to_string(),
            validation_secret: generate_validation_secret(VALIDATION_SECRET_LENGTH),
            protocol: ProtocolVariant::default(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PaymentError::ConfigError(format!("Invalid gateway config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.submission_endpoint.trim().is_empty() {
            return Err(PaymentError::ConfigError(
                "submission_endpoint must not be empty".to_string(),
            ));
        }
        if self.validation_secret.is_empty() {
            return Err(PaymentError::ConfigError(
                "validation_secret must not be empty".to_string(),
            ));
        }
        if self.transaction_mode == TransactionMode::Live && self.live_key.is_empty() {
            return Err(PaymentError::ConfigError(
                "live_key is required in live mode".to_string(),
            ));
        }
        Ok(())
    }

    /// The live key iff the mode is `live`, else the test key.
    pub fn application_key(&self) -> &str {
        match self.transaction_mode {
            TransactionMode::Live => &self.live_key,
            TransactionMode::Test => &self.test_key,
        }
    }

    pub fn gateway_protocol(&self) -> GatewayProtocol {
        self.protocol.protocol()
    }
}

/// Random printable ASCII string.
pub fn generate_validation_secret(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(rng.gen_range(32u8..=126u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.transaction_mode, TransactionMode::Test);
        assert_eq!(config.submission_endpoint, LITE_SUBMISSION_ENDPOINT);
        assert_eq!(config.currency, "ZAR");
        assert_eq!(config.validation_secret.chars().count(), VALIDATION_SECRET_LENGTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_application_key_follows_mode() {
        let mut config = GatewayConfig {
            test_key: "test-app".to_string(),
            live_key: "live-app".to_string(),
            ..Default::default()
        };
        assert_eq!(config.application_key(), "test-app");
        config.transaction_mode = TransactionMode::Live;
        assert_eq!(config.application_key(), "live-app");
    }

    #[test]
    fn test_from_json_partial() {
        let config = GatewayConfig::from_json(
            r#"{"test_key": "abc", "protocol": "lite_get", "transaction_mode": "test"}"#,
        )
        .unwrap();
        assert_eq!(config.test_key, "abc");
        assert_eq!(config.protocol, ProtocolVariant::LiteGet);
        assert_eq!(config.auth_info_endpoint, LITE_AUTH_INFO_ENDPOINT);
    }

    #[test]
    fn test_live_mode_requires_key() {
        let result = GatewayConfig::from_json(r#"{"transaction_mode": "live"}"#);
        assert!(matches!(result, Err(PaymentError::ConfigError(_))));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result = GatewayConfig::from_json(r#"{"transaction_mode": "staging"}"#);
        assert!(matches!(result, Err(PaymentError::ConfigError(_))));
    }

    #[test]
    fn test_secret_is_printable() {
        let secret = generate_validation_secret(64);
        assert!(secret.chars().all(|c| (' '..='~').contains(&c)));
    }
}
