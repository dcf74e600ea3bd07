// crates/timevault-core/src/value.rs
// ============================================================================
// Module: Value Encoder
// Description: SQL literal encoding for every supported column value type.
// Purpose: Single injection-safety point for values embedded in dump text.
// Dependencies: time
// ============================================================================

//! ## Overview
//! [`encode`] is a deterministic total function from a [`SqlValue`] to the
//! literal text form embedded in generated insert statements. Table and
//! column names are constrained separately by the catalog whitelist; this
//! module is responsible only for value safety. Embedded quote characters in
//! text are doubled so a literal can never terminate early.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use time::PrimitiveDateTime;
use time::Time;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Literal emitted for null column values.
pub const NULL_LITERAL: &str = "NULL";

// ============================================================================
// SECTION: Value Model
// ============================================================================

/// A single column value supported by the dump format.
///
/// # Invariants
/// - `Text` carries raw (unescaped) content; escaping happens in [`encode`].
/// - `Blob` carries raw bytes; hex encoding happens in [`encode`].
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Absent value.
    Null,
    /// Boolean flag, stored as the canonical integers 1/0.
    Boolean(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating-point number.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Calendar timestamp with second precision.
    Timestamp(PrimitiveDateTime),
    /// Time of day with second precision.
    TimeOfDay(Time),
    /// Binary payload.
    Blob(Vec<u8>),
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes a value into its SQL literal text form.
///
/// Total over the supported type set: non-finite reals degrade to the null
/// marker because SQL carries no NaN/infinity literal.
#[must_use]
pub fn encode(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => NULL_LITERAL.to_string(),
        SqlValue::Boolean(flag) => {
            if *flag {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        SqlValue::Integer(number) => number.to_string(),
        SqlValue::Real(number) => {
            if number.is_finite() {
                number.to_string()
            } else {
                NULL_LITERAL.to_string()
            }
        }
        SqlValue::Text(text) => quote_text(text),
        SqlValue::Timestamp(stamp) => format!("'{}'", format_timestamp(*stamp)),
        SqlValue::TimeOfDay(clock) => format!("'{}'", format_time_of_day(*clock)),
        SqlValue::Blob(bytes) => encode_blob(bytes),
    }
}

/// Quotes text with embedded single quotes doubled.
#[must_use]
pub fn quote_text(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            literal.push('\'');
        }
        literal.push(ch);
    }
    literal.push('\'');
    literal
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_timestamp(stamp: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {}",
        stamp.year(),
        u8::from(stamp.month()),
        stamp.day(),
        format_time_of_day(stamp.time())
    )
}

/// Formats a time of day as `HH:MM:SS`.
#[must_use]
pub fn format_time_of_day(clock: Time) -> String {
    format!("{:02}:{:02}:{:02}", clock.hour(), clock.minute(), clock.second())
}

/// Encodes binary data as a quoted hex literal (`X'AB01'`).
fn encode_blob(bytes: &[u8]) -> String {
    let mut literal = String::with_capacity(bytes.len() * 2 + 3);
    literal.push_str("X'");
    for byte in bytes {
        // Infallible for String targets.
        let _ = write!(&mut literal, "{byte:02X}");
    }
    literal.push('\'');
    literal
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use time::Date;
    use time::Month;
    use time::PrimitiveDateTime;
    use time::Time;

    use super::SqlValue;
    use super::encode;

    #[test]
    fn encodes_primitive_literals() {
        assert_eq!(encode(&SqlValue::Null), "NULL");
        assert_eq!(encode(&SqlValue::Boolean(true)), "1");
        assert_eq!(encode(&SqlValue::Boolean(false)), "0");
        assert_eq!(encode(&SqlValue::Integer(-42)), "-42");
        assert_eq!(encode(&SqlValue::Real(1.5)), "1.5");
    }

    #[test]
    fn non_finite_reals_degrade_to_null() {
        assert_eq!(encode(&SqlValue::Real(f64::NAN)), "NULL");
        assert_eq!(encode(&SqlValue::Real(f64::INFINITY)), "NULL");
    }

    #[test]
    fn doubles_embedded_quotes() {
        let value = SqlValue::Text("O'Brien; DROP TABLE users; --".to_string());
        assert_eq!(encode(&value), "'O''Brien; DROP TABLE users; --'");
    }

    #[test]
    fn encodes_temporal_literals() {
        let date = Date::from_calendar_date(2026, Month::March, 7).unwrap();
        let clock = Time::from_hms(9, 5, 30).unwrap();
        let stamp = PrimitiveDateTime::new(date, clock);
        assert_eq!(encode(&SqlValue::Timestamp(stamp)), "'2026-03-07 09:05:30'");
        assert_eq!(encode(&SqlValue::TimeOfDay(clock)), "'09:05:30'");
    }

    #[test]
    fn encodes_blob_as_hex() {
        assert_eq!(encode(&SqlValue::Blob(vec![0x00, 0xAB, 0x10])), "X'00AB10'");
        assert_eq!(encode(&SqlValue::Blob(Vec::new())), "X''");
    }
}
