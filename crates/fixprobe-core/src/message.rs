//! Tag/value message model.
//!
//! Messages are kept as ordered field maps (header and body). Framing,
//! BodyLength and CheckSum belong to the session engine and are never
//! computed here; `Display` renders a `|`-delimited form for logging.

use crate::error::{CoreError, Result};
use std::fmt;
use std::str::FromStr;

/// Field tags used by the client.
pub mod tags {
    pub const BEGIN_STRING: u32 = 8;
    pub const CUM_QTY: u32 = 14;
    pub const EXEC_ID: u32 = 17;
    pub const CL_ORD_ID: u32 = 11;
    pub const MSG_SEQ_NUM: u32 = 34;
    pub const MSG_TYPE: u32 = 35;
    pub const ORDER_ID: u32 = 37;
    pub const ORDER_QTY: u32 = 38;
    pub const ORD_STATUS: u32 = 39;
    pub const ORD_TYPE: u32 = 40;
    pub const ORIG_CL_ORD_ID: u32 = 41;
    pub const PRICE: u32 = 44;
    pub const REF_SEQ_NUM: u32 = 45;
    pub const SENDER_COMP_ID: u32 = 49;
    pub const SENDING_TIME: u32 = 52;
    pub const SIDE: u32 = 54;
    pub const SYMBOL: u32 = 55;
    pub const TARGET_COMP_ID: u32 = 56;
    pub const TEXT: u32 = 58;
    pub const TIME_IN_FORCE: u32 = 59;
    pub const RAW_DATA_LENGTH: u32 = 95;
    pub const RAW_DATA: u32 = 96;
    pub const ENCRYPT_METHOD: u32 = 98;
    pub const HEART_BT_INT: u32 = 108;
    pub const RESET_SEQ_NUM_FLAG: u32 = 141;
    pub const EXEC_TYPE: u32 = 150;
    pub const LEAVES_QTY: u32 = 151;
    pub const REF_MSG_TYPE: u32 = 372;
    pub const SESSION_REJECT_REASON: u32 = 373;
    pub const BUSINESS_REJECT_REF_ID: u32 = 379;
}

/// Message type (tag 35).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MsgType {
    Heartbeat,
    TestRequest,
    Reject,
    Logout,
    ExecutionReport,
    Logon,
    NewOrderSingle,
    OrderCancelRequest,
    OrderStatusRequest,
    BusinessMessageReject,
    /// Any type the client does not act on.
    Other(String),
}

impl MsgType {
    /// Wire value of the type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Heartbeat => "0",
            Self::TestRequest => "1",
            Self::Reject => "3",
            Self::Logout => "5",
            Self::ExecutionReport => "8",
            Self::Logon => "A",
            Self::NewOrderSingle => "D",
            Self::OrderCancelRequest => "F",
            Self::OrderStatusRequest => "H",
            Self::BusinessMessageReject => "j",
            Self::Other(s) => s,
        }
    }

    /// Whether the type belongs to the session (admin) layer.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Self::Heartbeat | Self::TestRequest | Self::Reject | Self::Logout | Self::Logon
        )
    }
}

impl From<&str> for MsgType {
    fn from(s: &str) -> Self {
        match s {
            "0" => Self::Heartbeat,
            "1" => Self::TestRequest,
            "3" => Self::Reject,
            "5" => Self::Logout,
            "8" => Self::ExecutionReport,
            "A" => Self::Logon,
            "D" => Self::NewOrderSingle,
            "F" => Self::OrderCancelRequest,
            "H" => Self::OrderStatusRequest,
            "j" => Self::BusinessMessageReject,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered tag/value fields. Setting an existing tag replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<(u32, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value for the tag.
    pub fn set(&mut self, tag: u32, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(t, _)| *t == tag) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((tag, value)),
        }
    }

    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.as_str())
    }

    /// Get a field that must be present.
    pub fn require(&self, tag: u32) -> Result<&str> {
        self.get(tag).ok_or(CoreError::MissingField(tag))
    }

    /// Get and parse a field that must be present.
    pub fn require_parsed<T: FromStr>(&self, tag: u32) -> Result<T> {
        let raw = self.require(tag)?;
        raw.parse().map_err(|_| CoreError::InvalidFieldValue {
            tag,
            value: raw.to_string(),
        })
    }

    pub fn contains(&self, tag: u32) -> bool {
        self.get(tag).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.fields.iter().map(|(t, v)| (*t, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A protocol message: header fields plus body fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    header: FieldMap,
    body: FieldMap,
}

impl Message {
    /// Create an empty message of the given type.
    pub fn new(msg_type: MsgType) -> Self {
        let mut message = Self::default();
        message.header.set(tags::MSG_TYPE, msg_type.as_str());
        message
    }

    pub fn header(&self) -> &FieldMap {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut FieldMap {
        &mut self.header
    }

    pub fn body(&self) -> &FieldMap {
        &self.body
    }

    /// Set a body field.
    pub fn set_field(&mut self, tag: u32, value: impl Into<String>) {
        self.body.set(tag, value);
    }

    /// Get a body field.
    pub fn field(&self, tag: u32) -> Option<&str> {
        self.body.get(tag)
    }

    /// Message type from the header. Messages without tag 35 classify as `Other("")`.
    pub fn msg_type(&self) -> MsgType {
        MsgType::from(self.header.get(tags::MSG_TYPE).unwrap_or(""))
    }

    /// Header MsgSeqNum, if the engine has assigned one.
    pub fn seq_num(&self) -> Option<u64> {
        self.header.get(tags::MSG_SEQ_NUM)?.parse().ok()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (tag, value) in self.header.iter().chain(self.body.iter()) {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{tag}={value}")?;
            first = false;
        }
        Ok(())
    }
}
