//! Application configuration.

use std::collections::HashSet;
use std::path::Path;

use fixprobe_session::SessionSettings;
use fixprobe_workflow::WorkflowConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::simulator::GatewayConfig;

/// Prefix of environment overrides, e.g. `FIXPROBE__WORKFLOW__PACING_MS=500`.
pub const ENV_PREFIX: &str = "FIXPROBE";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level selector (`RUST_LOG` overrides). Default: "info".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Sessions to establish.
    #[serde(default)]
    pub sessions: SessionSettings,

    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load from a TOML file with `FIXPROBE__*` environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parse TOML text directly (no environment overlay).
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> AppResult<()> {
        if self.sessions.is_empty() {
            return Err(AppError::Config("no sessions configured".to_string()));
        }

        let mut seen = HashSet::new();
        for session in self.sessions.iter() {
            let id = session.session_id();
            if !seen.insert(id.clone()) {
                return Err(AppError::Config(format!("duplicate session {id}")));
            }
            if session.key_source().is_none() {
                return Err(AppError::Config(format!("session {id} has no private key")));
            }
        }

        self.workflow.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use rust_decimal_macros::dec;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [[sessions]]
        sender_comp_id = "CLIENT1"
        target_comp_id = "GATEWAY"
        private_key = "c2VjcmV0"
    "#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.workflow, WorkflowConfig::default());
        assert_eq!(config.gateway, GatewayConfig::default());
        assert_eq!(config.sessions.session_ids().len(), 1);
        assert_ok!(config.validate());
    }

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml_str(
            r#"
            log_level = "debug"

            [workflow]
            pacing_ms = 100

            [workflow.order]
            symbol = "ETH-AUD"
            price = "2500.5"
            quantity = "2"
            side = "sell"

            [workflow.invalid_order]
            quantity = "99999999"

            [gateway]
            max_order_qty = 1000
            symbols = ["ETH-AUD"]
            verify_signature = false

            [[sessions]]
            sender_comp_id = "CLIENT1"
            target_comp_id = "GATEWAY"
            heartbeat_interval_secs = 5
            private_key_env = "FIXPROBE_TEST_KEY"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.workflow.pacing_ms, 100);
        assert_eq!(config.workflow.order.price, "2500.5");
        assert_eq!(config.workflow.invalid_order.quantity, "99999999");
        assert_eq!(config.gateway.max_order_qty, dec!(1000));
        assert!(!config.gateway.verify_signature);
        let session = config.sessions.iter().next().unwrap();
        assert_eq!(session.heartbeat_interval_secs, 5);
        assert_ok!(config.validate());
    }

    #[test]
    fn test_validate_rejects_empty_sessions() {
        let config = AppConfig::from_toml_str("log_level = \"info\"").unwrap();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_sessions() {
        let doubled = format!("{MINIMAL}\n{MINIMAL}");
        let config = AppConfig::from_toml_str(&doubled).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate session"));
    }

    #[test]
    fn test_validate_rejects_session_without_key() {
        let config = AppConfig::from_toml_str(
            r#"
            [[sessions]]
            sender_comp_id = "CLIENT1"
            target_comp_id = "GATEWAY"
            "#,
        )
        .unwrap();
        assert_err!(config.validate());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        file.write_all(b"\n[workflow]\npacing_ms = 42\n").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.workflow.pacing_ms, 42);
        assert_eq!(config.sessions.session_ids().len(), 1);
    }

    #[test]
    fn test_from_file_missing() {
        let result = AppConfig::from_file("/nonexistent/fixprobe.toml");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
