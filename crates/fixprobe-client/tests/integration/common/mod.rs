//! Shared helpers for integration tests.

pub mod recording_app;

use fixprobe_client::{AppConfig, GatewayConfig};
use fixprobe_session::{SessionConfig, SessionSettings};
use fixprobe_workflow::WorkflowConfig;

pub const SECRET: &str = "Zml4cHJvYmUtdGVzdC1zZWNyZXQta2V5LTAxMjM0NTY3ODk=";

/// Base64 of "another-secret".
pub const OTHER_SECRET: &str = "YW5vdGhlci1zZWNyZXQ=";

pub fn session_settings(secret: Option<&str>, heartbeat_secs: u64) -> SessionSettings {
    let mut config = SessionConfig::new("CLIENT1", "GATEWAY");
    config.heartbeat_interval_secs = heartbeat_secs;
    if let Some(secret) = secret {
        config = config.with_private_key(secret);
    }
    SessionSettings::new(vec![config])
}

pub fn workflow_config(pacing_ms: u64) -> WorkflowConfig {
    WorkflowConfig {
        pacing_ms,
        ..WorkflowConfig::default()
    }
}

pub fn app_config(pacing_ms: u64, heartbeat_secs: u64) -> AppConfig {
    AppConfig {
        log_level: "debug".to_string(),
        workflow: workflow_config(pacing_ms),
        sessions: session_settings(Some(SECRET), heartbeat_secs),
        gateway: GatewayConfig::default(),
    }
}
