// crates/timevault-core/tests/proptest_value.rs
// ============================================================================
// Module: Value Encoding Property Tests
// Description: Escaping and statement-shape invariants under arbitrary input.
// Purpose: Ensure hostile value content can never break statement framing.
// ============================================================================

//! ## Overview
//! For arbitrary text content (including quotes, semicolons, and SQL-looking
//! fragments), an encoded value embedded in a rendered insert statement must
//! parse back as exactly one statement for exactly the intended table, and
//! quote collapsing must recover the original content.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use timevault_core::dump::render_insert;
use timevault_core::parse;
use timevault_core::value::SqlValue;
use timevault_core::value::encode;
use timevault_core::value::quote_text;

/// Strips outer quotes and collapses doubled quotes back to singles.
fn unquote(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

proptest! {
    #[test]
    fn text_quoting_round_trips(content in ".*") {
        let literal = quote_text(&content);
        prop_assert_eq!(unquote(&literal), Some(content));
    }

    #[test]
    fn hostile_text_cannot_escape_statement_framing(content in ".*") {
        let columns = vec!["id".to_string(), "full_name".to_string()];
        let values = vec![SqlValue::Integer(7), SqlValue::Text(content)];
        let statement = render_insert("users", &columns, &values).unwrap();
        let document = parse(&statement);
        prop_assert_eq!(document.statement_count(), 1);
        prop_assert_eq!(document.statements_for("users").len(), 1);
        prop_assert_eq!(document.statements_for("users")[0].as_str(), statement.as_str());
    }

    #[test]
    fn integer_encoding_is_plain_decimal(number in any::<i64>()) {
        prop_assert_eq!(encode(&SqlValue::Integer(number)), number.to_string());
    }

    #[test]
    fn finite_real_encoding_round_trips_via_display(number in any::<f64>()) {
        prop_assume!(number.is_finite());
        let text = encode(&SqlValue::Real(number));
        let parsed: f64 = text.parse().unwrap();
        prop_assert_eq!(parsed.to_bits(), number.to_bits());
    }
}
