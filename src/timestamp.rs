//! # Timestamp Parsing
//!
//! Normalizes the heterogeneous `timestamp` query encodings accepted by the API
//! into a single timezone-aware UTC instant.
//!
//! ## Accepted Forms (tried in order):
//! 1. **Integer**: epoch milliseconds when the magnitude exceeds 10^12,
//!    otherwise epoch seconds
//! 2. **ISO-8601**: a trailing `Z` means UTC, any other offset is normalized
//!    to UTC, and a naive datetime (no offset at all) is assumed to be UTC
//!
//! Anything else is an `InvalidTimestamp` error that surfaces to the client
//! as a 400 with the offending value in the message.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::AppError;

/// Integer values above this magnitude are interpreted as epoch milliseconds.
const EPOCH_MILLIS_CUTOFF: i64 = 1_000_000_000_000;

/// Parse a timestamp string into a UTC instant.
pub fn parse_timestamp(param: &str) -> Result<DateTime<Utc>, AppError> {
    // Epoch integer (seconds or milliseconds)
    if let Ok(as_int) = param.parse::<i64>() {
        let parsed = if as_int.abs() > EPOCH_MILLIS_CUTOFF {
            DateTime::<Utc>::from_timestamp_millis(as_int)
        } else {
            DateTime::<Utc>::from_timestamp(as_int, 0)
        };
        return parsed.ok_or_else(|| AppError::InvalidTimestamp(param.to_string()));
    }

    // ISO-8601 with an explicit offset (`Z` or `+hh:mm`), normalized to UTC
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(param) {
        return Ok(with_offset.with_timezone(&Utc));
    }

    // Naive ISO-8601 datetime, assumed UTC
    if let Ok(naive) = param.parse::<NaiveDateTime>() {
        return Ok(naive.and_utc());
    }

    Err(AppError::InvalidTimestamp(param.to_string()))
}
