//! Sending-time handling.
//!
//! The gateway stamps messages with `YYYYMMDD-HH:MM:SS.ffffff` (UTC). The
//! logon signature covers the same instant expressed as milliseconds since
//! the Unix epoch, so the conversion must be exact integer arithmetic.

use crate::error::{CoreError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Format used for SendingTime (tag 52) when writing.
pub const SENDING_TIME_FORMAT: &str = "%Y%m%d-%H:%M:%S%.6f";

/// Format used for SendingTime when parsing. The fraction is checked separately.
const SENDING_TIME_PARSE_FORMAT: &str = "%Y%m%d-%H:%M:%S%.f";

/// Most fractional digits a sending time may carry (microseconds).
const MAX_FRACTION_DIGITS: usize = 6;

/// Format a UTC instant as a sending time with microsecond precision.
pub fn format_sending_time(at: DateTime<Utc>) -> String {
    at.format(SENDING_TIME_FORMAT).to_string()
}

/// Parse a sending time into a UTC instant.
pub fn parse_sending_time(value: &str) -> Result<DateTime<Utc>> {
    let Some((_, fraction)) = value.split_once('.') else {
        return Err(CoreError::TimestampParse {
            value: value.to_string(),
            reason: "missing fractional seconds".to_string(),
        });
    };
    if fraction.is_empty()
        || fraction.len() > MAX_FRACTION_DIGITS
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(CoreError::TimestampParse {
            value: value.to_string(),
            reason: format!("fractional seconds must be 1 to {MAX_FRACTION_DIGITS} digits"),
        });
    }
    let naive = NaiveDateTime::parse_from_str(value, SENDING_TIME_PARSE_FORMAT).map_err(|e| {
        CoreError::TimestampParse {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Milliseconds since the Unix epoch for a sending time, truncating sub-millisecond digits.
pub fn sending_time_to_epoch_ms(value: &str) -> Result<i64> {
    Ok(parse_sending_time(value)?.timestamp_millis())
}
