//! Order-related types and identifiers.
//!
//! Provides order side, type, time-in-force, execution report classification
//! and the client order ID type used by the workflow.

use crate::error::{CoreError, Result};
use crate::message::tags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Wire code (tag 54).
    pub fn as_fix(&self) -> &'static str {
        match self {
            Self::Buy => "1",
            Self::Sell => "2",
        }
    }

    pub fn from_fix(value: &str) -> Result<Self> {
        match value {
            "1" => Ok(Self::Buy),
            "2" => Ok(Self::Sell),
            other => Err(CoreError::InvalidFieldValue {
                tag: tags::SIDE,
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Order type (tag 40).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrdType {
    Market,
    Limit,
}

impl OrdType {
    pub fn as_fix(&self) -> &'static str {
        match self {
            Self::Market => "1",
            Self::Limit => "2",
        }
    }

    pub fn from_fix(value: &str) -> Result<Self> {
        match value {
            "1" => Ok(Self::Market),
            "2" => Ok(Self::Limit),
            other => Err(CoreError::InvalidFieldValue {
                tag: tags::ORD_TYPE,
                value: other.to_string(),
            }),
        }
    }

    /// Only limit orders carry a price.
    pub fn requires_price(&self) -> bool {
        matches!(self, Self::Limit)
    }
}

impl fmt::Display for OrdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "market"),
            Self::Limit => write!(f, "limit"),
        }
    }
}

/// Time-in-force (tag 59).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Day,
    /// Good-til-cancelled.
    #[default]
    Gtc,
    /// Immediate-or-cancel.
    Ioc,
}

impl TimeInForce {
    pub fn as_fix(&self) -> &'static str {
        match self {
            Self::Day => "0",
            Self::Gtc => "1",
            Self::Ioc => "3",
        }
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "Day"),
            Self::Gtc => write!(f, "Gtc"),
            Self::Ioc => write!(f, "Ioc"),
        }
    }
}

/// Execution type of an execution report (tag 150).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecType {
    New,
    PartialFill,
    Fill,
    Canceled,
    Replaced,
    Rejected,
    Trade,
    /// Response to an order status request.
    OrderStatus,
}

impl ExecType {
    pub fn as_fix(&self) -> &'static str {
        match self {
            Self::New => "0",
            Self::PartialFill => "1",
            Self::Fill => "2",
            Self::Canceled => "4",
            Self::Replaced => "5",
            Self::Rejected => "8",
            Self::Trade => "F",
            Self::OrderStatus => "I",
        }
    }

    /// Parse a wire code. Unknown codes yield `None`.
    pub fn from_fix(value: &str) -> Option<Self> {
        match value {
            "0" => Some(Self::New),
            "1" => Some(Self::PartialFill),
            "2" => Some(Self::Fill),
            "4" => Some(Self::Canceled),
            "5" => Some(Self::Replaced),
            "8" => Some(Self::Rejected),
            "F" => Some(Self::Trade),
            "I" => Some(Self::OrderStatus),
            _ => None,
        }
    }

    /// New, partial fill and trade reports are the expected acknowledgements
    /// of a fresh order.
    pub fn is_order_ack(&self) -> bool {
        matches!(self, Self::New | Self::PartialFill | Self::Trade)
    }
}

/// Order status (tag 39).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrdStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

impl OrdStatus {
    pub fn as_fix(&self) -> &'static str {
        match self {
            Self::New => "0",
            Self::PartiallyFilled => "1",
            Self::Filled => "2",
            Self::Canceled => "4",
            Self::Rejected => "8",
        }
    }

    pub fn from_fix(value: &str) -> Option<Self> {
        match value {
            "0" => Some(Self::New),
            "1" => Some(Self::PartiallyFilled),
            "2" => Some(Self::Filled),
            "4" => Some(Self::Canceled),
            "8" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether the order can still be cancelled.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::New | Self::PartiallyFilled)
    }
}

/// Which invalid-request probe an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// New order that the gateway must reject.
    InvalidCreate,
    /// Cancel of an order the gateway has never seen.
    InvalidCancel,
}

impl ProbeKind {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::InvalidCreate => "InvalidOrderCreate",
            Self::InvalidCancel => "InvalidOrderCancel",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Client order ID (tag 11).
///
/// Ids are derived from millisecond timestamps:
/// - primary requests: `ID-{ts}`
/// - probes: `{ts}-InvalidOrderCreate` / `{ts}-InvalidOrderCancel`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClOrdId(String);

impl ClOrdId {
    pub const PRIMARY_PREFIX: &'static str = "ID-";

    /// Primary request id for a timestamp.
    pub fn primary(timestamp_ms: u64) -> Self {
        Self(format!("{}{timestamp_ms}", Self::PRIMARY_PREFIX))
    }

    /// Probe id for a timestamp.
    pub fn probe(timestamp_ms: u64, kind: ProbeKind) -> Self {
        Self(format!("{timestamp_ms}-{}", kind.suffix()))
    }

    /// Create from an existing string (for parsing inbound messages).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The probe this id was generated for, read from the segment after the first `-`.
    pub fn probe_kind(&self) -> Option<ProbeKind> {
        let (_, tag) = self.0.split_once('-')?;
        let tag = tag.split('-').next().unwrap_or(tag);
        [ProbeKind::InvalidCreate, ProbeKind::InvalidCancel]
            .into_iter()
            .find(|kind| kind.suffix() == tag)
    }
}

impl fmt::Display for ClOrdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClOrdId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl From<&str> for ClOrdId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ClOrdId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_wire_codes() {
        assert_eq!(Side::Buy.as_fix(), "1");
        assert_eq!(Side::from_fix("2").unwrap(), Side::Sell);
        assert!(Side::from_fix("9").is_err());
    }

    #[test]
    fn test_only_limit_requires_price() {
        assert!(OrdType::Limit.requires_price());
        assert!(!OrdType::Market.requires_price());
        assert_eq!(OrdType::from_fix("1").unwrap(), OrdType::Market);
    }

    #[test]
    fn test_exec_type_parse() {
        assert_eq!(ExecType::from_fix("I"), Some(ExecType::OrderStatus));
        assert_eq!(ExecType::from_fix("4"), Some(ExecType::Canceled));
        assert_eq!(ExecType::from_fix("Z"), None);
        assert!(ExecType::Trade.is_order_ack());
        assert!(!ExecType::Rejected.is_order_ack());
    }

    #[test]
    fn test_client_order_id_formats() {
        assert_eq!(ClOrdId::primary(1704110400000).as_str(), "ID-1704110400000");
        assert_eq!(
            ClOrdId::probe(1704110400000, ProbeKind::InvalidCancel).as_str(),
            "1704110400000-InvalidOrderCancel"
        );
    }

    #[test]
    fn test_probe_kind_detection() {
        let create = ClOrdId::probe(42, ProbeKind::InvalidCreate);
        let cancel = ClOrdId::probe(42, ProbeKind::InvalidCancel);
        assert_eq!(create.probe_kind(), Some(ProbeKind::InvalidCreate));
        assert_eq!(cancel.probe_kind(), Some(ProbeKind::InvalidCancel));
        assert_eq!(ClOrdId::primary(42).probe_kind(), None);
        assert_eq!(ClOrdId::from("plain").probe_kind(), None);
    }
}
