//! Per-session settings and credential resolution.
//!
//! Security notes:
//! - Secrets are resolved once, when the session is created.
//! - Resolved secrets live in zeroizing buffers and are redacted in `Debug`.
//! - Never log secret material.

use crate::error::{SessionError, SessionResult};
use fixprobe_core::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Where a session's shared secret comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Inline in the settings file (development).
    Inline,
    /// Environment variable.
    EnvVar { var_name: String },
    /// File contents (production, recommend 0600 permissions).
    File { path: PathBuf },
}

/// Base64-encoded shared secret for one session.
#[derive(Clone)]
pub struct SessionSecret(Zeroizing<String>);

impl SessionSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(<redacted>)")
    }
}

/// Configuration of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Protocol version string. Default: "FIX.4.4".
    #[serde(default = "default_begin_string")]
    pub begin_string: String,
    pub sender_comp_id: String,
    pub target_comp_id: String,
    /// Heartbeat interval negotiated at logon (seconds). Default: 30.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Inline base64 secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Environment variable holding the base64 secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_env: Option<String>,
    /// File holding the base64 secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_file: Option<PathBuf>,
}

fn default_begin_string() -> String {
    "FIX.4.4".to_string()
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

impl SessionConfig {
    /// Session with default protocol settings and no credential.
    pub fn new(sender_comp_id: impl Into<String>, target_comp_id: impl Into<String>) -> Self {
        Self {
            begin_string: default_begin_string(),
            sender_comp_id: sender_comp_id.into(),
            target_comp_id: target_comp_id.into(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            private_key: None,
            private_key_env: None,
            private_key_file: None,
        }
    }

    /// Same session with an inline secret.
    pub fn with_private_key(mut self, secret: impl Into<String>) -> Self {
        self.private_key = Some(secret.into());
        self
    }

    pub fn session_id(&self) -> SessionId {
        SessionId::new(
            self.begin_string.clone(),
            self.sender_comp_id.clone(),
            self.target_comp_id.clone(),
        )
    }

    /// Configured credential source. Inline wins over env, env over file.
    pub fn key_source(&self) -> Option<KeySource> {
        if self.private_key.is_some() {
            Some(KeySource::Inline)
        } else if let Some(var_name) = &self.private_key_env {
            Some(KeySource::EnvVar {
                var_name: var_name.clone(),
            })
        } else {
            self.private_key_file
                .as_ref()
                .map(|path| KeySource::File { path: path.clone() })
        }
    }

    fn read_secret(&self, source: KeySource) -> SessionResult<String> {
        let raw = match source {
            KeySource::Inline => self.private_key.clone().unwrap_or_default(),
            KeySource::EnvVar { var_name } => std::env::var(&var_name).map_err(|_| {
                SessionError::CredentialSource(format!("environment variable {var_name} not set"))
            })?,
            KeySource::File { path } => std::fs::read_to_string(&path).map_err(|e| {
                SessionError::CredentialSource(format!("failed to read {}: {e}", path.display()))
            })?,
        };
        Ok(raw.trim().to_string())
    }
}

/// Settings for all configured sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionSettings {
    sessions: Vec<SessionConfig>,
}

impl SessionSettings {
    pub fn new(sessions: Vec<SessionConfig>) -> Self {
        Self { sessions }
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(SessionConfig::session_id).collect()
    }

    pub fn get(&self, session: &SessionId) -> Option<&SessionConfig> {
        self.sessions.iter().find(|s| &s.session_id() == session)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionConfig> {
        self.sessions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Resolve the shared secret for a session.
    ///
    /// # Errors
    /// - `SessionError::SessionNotFound`: session is not configured
    /// - `SessionError::MissingCredential`: no source configured, or it resolved to an empty value
    /// - `SessionError::CredentialSource`: the env var or file could not be read
    pub fn resolve_secret(&self, session: &SessionId) -> SessionResult<SessionSecret> {
        let config = self
            .get(session)
            .ok_or_else(|| SessionError::SessionNotFound(session.clone()))?;
        let source = config
            .key_source()
            .ok_or_else(|| SessionError::MissingCredential(session.clone()))?;
        let secret = config.read_secret(source)?;
        if secret.is_empty() {
            return Err(SessionError::MissingCredential(session.clone()));
        }
        Ok(SessionSecret::new(secret))
    }
}
