//! Logon signing.
//!
//! The gateway authenticates a session by an HMAC carried in the Logon:
//! 1. Concatenate `{MsgSeqNum}{MsgType}{SenderCompID}{SendingTime as epoch ms}`
//! 2. HMAC-SHA512 the UTF-8 bytes, keyed by the base64-decoded session secret
//! 3. Base64-encode the digest into RawData (96), its length into RawDataLength (95)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use fixprobe_core::time::sending_time_to_epoch_ms;
use fixprobe_core::{tags, CoreError, Message, MsgType, SessionId};
use fixprobe_session::SessionSecret;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

/// Sequence number signed when the Logon header carries none.
pub const DEFAULT_LOGON_SEQ_NUM: u64 = 1;

/// Signing errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("Failed to decode base64 secret: {0}")]
    SecretDecode(#[from] base64::DecodeError),

    #[error("Invalid HMAC key: {0}")]
    InvalidKey(String),

    #[error("Invalid sending time: {0}")]
    Timestamp(CoreError),

    #[error("Logon field error: {0}")]
    Field(CoreError),
}

// =============================================================================
// Signature computation
// =============================================================================

/// Build the string covered by the signature.
pub fn signing_payload(
    seq_num: u64,
    msg_type: &str,
    sender_comp_id: &str,
    sending_time_ms: &str,
) -> String {
    format!("{seq_num}{msg_type}{sender_comp_id}{sending_time_ms}")
}

fn keyed_mac(secret_b64: &str) -> Result<HmacSha512, SignerError> {
    let key = Zeroizing::new(BASE64.decode(secret_b64.trim())?);
    HmacSha512::new_from_slice(&key).map_err(|e| SignerError::InvalidKey(e.to_string()))
}

/// Compute the base64 HMAC-SHA512 signature.
///
/// Pure and deterministic: identical inputs always produce identical output.
///
/// # Errors
/// Returns `SignerError::SecretDecode` if `secret_b64` is not valid base64.
pub fn sign_message(
    seq_num: u64,
    msg_type: &str,
    sender_comp_id: &str,
    sending_time_ms: &str,
    secret_b64: &str,
) -> Result<String, SignerError> {
    let payload = signing_payload(seq_num, msg_type, sender_comp_id, sending_time_ms);
    debug!(payload = %payload, "Signing payload");

    let mut mac = keyed_mac(secret_b64)?;
    mac.update(payload.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Check a base64 signature in constant time.
///
/// Returns `Ok(false)` for a well-formed secret and a wrong or undecodable signature.
pub fn verify_message(
    signature_b64: &str,
    seq_num: u64,
    msg_type: &str,
    sender_comp_id: &str,
    sending_time_ms: &str,
    secret_b64: &str,
) -> Result<bool, SignerError> {
    let Ok(signature) = BASE64.decode(signature_b64) else {
        return Ok(false);
    };
    let payload = signing_payload(seq_num, msg_type, sender_comp_id, sending_time_ms);
    let mut mac = keyed_mac(secret_b64)?;
    mac.update(payload.as_bytes());
    Ok(mac.verify_slice(&signature).is_ok())
}

// =============================================================================
// LogonSigner
// =============================================================================

/// Fields of a Logon that feed the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogonFields {
    seq_num: u64,
    sending_time_ms: String,
}

impl LogonFields {
    fn extract(message: &Message) -> Result<Self, SignerError> {
        let seq_num = match message.header().get(tags::MSG_SEQ_NUM) {
            Some(_) => message
                .header()
                .require_parsed(tags::MSG_SEQ_NUM)
                .map_err(SignerError::Field)?,
            None => DEFAULT_LOGON_SEQ_NUM,
        };
        let sending_time = message
            .header()
            .require(tags::SENDING_TIME)
            .map_err(SignerError::Field)?;
        let sending_time_ms =
            sending_time_to_epoch_ms(sending_time).map_err(SignerError::Timestamp)?;
        Ok(Self {
            seq_num,
            sending_time_ms: sending_time_ms.to_string(),
        })
    }
}

/// Injects and checks Logon signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogonSigner;

impl LogonSigner {
    /// Sign an outbound Logon in place.
    ///
    /// Reads MsgSeqNum and SendingTime from the header, signs with the
    /// session's sender id and secret, and sets RawData/RawDataLength.
    /// Returns the signature.
    ///
    /// # Errors
    /// - `SignerError::Timestamp`: SendingTime is malformed
    /// - `SignerError::Field`: SendingTime missing or MsgSeqNum not numeric
    /// - `SignerError::SecretDecode`: secret is not base64
    pub fn sign_logon(
        &self,
        message: &mut Message,
        session: &SessionId,
        secret: &SessionSecret,
    ) -> Result<String, SignerError> {
        let fields = LogonFields::extract(message)?;
        let signature = sign_message(
            fields.seq_num,
            MsgType::Logon.as_str(),
            &session.sender_comp_id,
            &fields.sending_time_ms,
            secret.expose(),
        )?;

        message.set_field(tags::RAW_DATA_LENGTH, signature.len().to_string());
        message.set_field(tags::RAW_DATA, signature.clone());
        Ok(signature)
    }

    /// Verify the signature carried by an inbound Logon (counterparty side).
    ///
    /// A Logon without RawData verifies as `false`.
    pub fn verify_logon(
        &self,
        message: &Message,
        secret: &SessionSecret,
    ) -> Result<bool, SignerError> {
        let Some(signature) = message.field(tags::RAW_DATA) else {
            return Ok(false);
        };
        let fields = LogonFields::extract(message)?;
        let sender = message
            .header()
            .require(tags::SENDER_COMP_ID)
            .map_err(SignerError::Field)?;
        verify_message(
            signature,
            fields.seq_num,
            MsgType::Logon.as_str(),
            sender,
            &fields.sending_time_ms,
            secret.expose(),
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
