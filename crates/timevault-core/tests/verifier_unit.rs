// crates/timevault-core/tests/verifier_unit.rs
// ============================================================================
// Module: Dump Verifier Unit Tests
// Description: Fatal/warning split for read-only dump verification.
// Purpose: Pin short-circuit order and the warning-only nature of drift.
// ============================================================================

//! ## Overview
//! Fatal conditions (missing file, empty file, missing header, declared
//! records with zero statements) must invalidate a dump; statistical
//! mismatches, essential-table emptiness, and schema-version drift are
//! warnings that never flip validity.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use timevault_core::SCHEMA_VERSION;
use timevault_core::TableCatalog;
use timevault_core::dump::render_footer;
use timevault_core::dump::render_header;
use timevault_core::dump::render_insert;
use timevault_core::dump::render_records_line;
use timevault_core::dump::render_table_marker;
use timevault_core::value::SqlValue;
use timevault_core::verify;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Writes dump text under the temp directory and returns its path.
fn write_dump(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    path
}

/// Builds a structurally clean two-statement dump with the given footer total.
fn well_formed_dump(declared_total: u64) -> String {
    let mut text = String::from('\u{feff}');
    text.push_str(&render_header(SCHEMA_VERSION, "2026-08-28 10:00:00", "HOST-01"));
    text.push_str(&render_table_marker("departments"));
    text.push('\n');
    let statement = render_insert(
        "departments",
        &["id".to_string(), "name".to_string()],
        &[SqlValue::Integer(1), SqlValue::Text("IT".to_string())],
    )
    .unwrap();
    text.push_str(&statement);
    text.push('\n');
    text.push_str(&render_records_line(1));
    text.push('\n');
    text.push_str(&render_table_marker("users"));
    text.push('\n');
    let statement = render_insert(
        "users",
        &["id".to_string(), "full_name".to_string(), "department_id".to_string()],
        &[
            SqlValue::Integer(1),
            SqlValue::Text("Ali".to_string()),
            SqlValue::Integer(1),
        ],
    )
    .unwrap();
    text.push_str(&statement);
    text.push('\n');
    text.push_str(&render_records_line(1));
    text.push('\n');
    text.push_str(&render_footer(declared_total));
    text.push('\n');
    text
}

// ============================================================================
// SECTION: Fatal Conditions
// ============================================================================

#[test]
fn missing_file_is_fatal() {
    let temp = TempDir::new().unwrap();
    let catalog = TableCatalog::attendance();
    let result = verify(&temp.path().join("absent.sql"), &catalog);
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("not found"));
}

#[test]
fn zero_byte_file_is_fatal() {
    let temp = TempDir::new().unwrap();
    let catalog = TableCatalog::attendance();
    let path = write_dump(&temp, "empty.sql", "");
    let result = verify(&path, &catalog);
    assert!(!result.is_valid);
    assert!(result.errors[0].contains("empty"));
}

#[test]
fn missing_header_marker_is_fatal() {
    let temp = TempDir::new().unwrap();
    let catalog = TableCatalog::attendance();
    let path = write_dump(&temp, "headerless.sql", "INSERT INTO \"users\" (id) VALUES (1);\n");
    let result = verify(&path, &catalog);
    assert!(!result.is_valid);
    assert!(!result.header_present);
    assert!(result.errors[0].contains("header"));
}

#[test]
fn declared_records_without_statements_is_fatal() {
    let temp = TempDir::new().unwrap();
    let catalog = TableCatalog::attendance();
    let body = format!("-- TIMEVAULT BACKUP --\n{}\n", render_footer(5));
    let path = write_dump(&temp, "hollow.sql", &body);
    let result = verify(&path, &catalog);
    assert!(!result.is_valid);
    assert!(result.errors[0].contains("no valid statements"));
}

// ============================================================================
// SECTION: Warning Conditions
// ============================================================================

#[test]
fn footer_count_mismatch_is_warning_only() {
    let temp = TempDir::new().unwrap();
    let catalog = TableCatalog::attendance();
    let path = write_dump(&temp, "mismatch.sql", &well_formed_dump(99));
    let result = verify(&path, &catalog);
    assert!(result.is_valid, "count mismatch must stay a warning");
    assert!(result.warnings.iter().any(|warning| warning.contains("footer declares 99")));
}

#[test]
fn schema_version_drift_is_warning_only() {
    let temp = TempDir::new().unwrap();
    let catalog = TableCatalog::attendance();
    let body = well_formed_dump(2).replace(SCHEMA_VERSION, "0.0.1");
    let path = write_dump(&temp, "drift.sql", &body);
    let result = verify(&path, &catalog);
    assert!(result.is_valid);
    assert!(result.warnings.iter().any(|warning| warning.contains("schema version")));
}

#[test]
fn empty_essential_table_is_warning_only() {
    let temp = TempDir::new().unwrap();
    let catalog = TableCatalog::attendance();
    let body = format!(
        "-- TIMEVAULT BACKUP --\n-- SCHEMA_VERSION: {SCHEMA_VERSION}\nINSERT INTO \"shifts\" (id, \
         name) VALUES (1, 'Day');\n{}\n",
        render_footer(1)
    );
    let path = write_dump(&temp, "no-users.sql", &body);
    let result = verify(&path, &catalog);
    assert!(result.is_valid);
    assert!(result.warnings.iter().any(|warning| warning.contains("essential table users")));
    assert!(result.warnings.iter().any(|warning| warning.contains("essential table departments")));
}

#[test]
fn clean_dump_verifies_without_findings() {
    let temp = TempDir::new().unwrap();
    let catalog = TableCatalog::attendance();
    let path = write_dump(&temp, "clean.sql", &well_formed_dump(2));
    let result = verify(&path, &catalog);
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
    assert_eq!(result.statements_parsed, 2);
    assert_eq!(result.declared_total, Some(2));
    let users = result.table_counts.iter().find(|count| count.table == "users").unwrap();
    assert_eq!(users.declared, Some(1));
    assert_eq!(users.actual, 1);
}
