// crates/timevault-core/src/dump.rs
// ============================================================================
// Module: Dump Format
// Description: Dump artifact markers and statement rendering.
// Purpose: Define the portable text format shared by writer, parser, verifier.
// Dependencies: crate::value, thiserror
// ============================================================================

//! ## Overview
//! A dump is a BOM-prefixed UTF-8 text artifact: a sentinel line, labeled
//! header lines, one section per table (marker line, one insert statement per
//! row, declared record count), and a footer with the declared total. This
//! module owns the marker constants and the rendering helpers producing each
//! piece; parsing lives in [`crate::parser`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::value::SqlValue;
use crate::value::encode;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Schema version stamped into new dumps and checked by the verifier.
pub const SCHEMA_VERSION: &str = "1.4.0";
/// Byte-order marker prefixed to every dump file.
pub const BOM: char = '\u{feff}';
/// Sentinel line identifying a file as a timevault dump.
pub const DUMP_SENTINEL: &str = "-- TIMEVAULT BACKUP --";
/// Header label carrying the schema version.
pub const SCHEMA_VERSION_LABEL: &str = "-- SCHEMA_VERSION:";
/// Header label carrying the capture timestamp.
pub const CREATED_AT_LABEL: &str = "-- CREATED_AT:";
/// Header label carrying the source host identifier.
pub const MACHINE_NAME_LABEL: &str = "-- MACHINE_NAME:";
/// Marker opening a per-table section.
pub const TABLE_LABEL: &str = "-- TABLE:";
/// Marker closing a per-table section with its declared row count.
pub const RECORDS_LABEL: &str = "-- Records:";
/// Footer marker carrying the declared total record count.
pub const FOOTER_LABEL: &str = "-- BACKUP COMPLETE:";

// ============================================================================
// SECTION: Header
// ============================================================================

/// Header metadata extracted from (or rendered into) a dump.
///
/// # Invariants
/// - Fields are `None` when the corresponding labeled line is absent;
///   restore tolerates missing fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpHeader {
    /// Declared schema version string.
    pub schema_version: Option<String>,
    /// Capture timestamp in `YYYY-MM-DD HH:MM:SS` form.
    pub created_at: Option<String>,
    /// Source host identifier.
    pub machine_name: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Dump rendering errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DumpError {
    /// Row value count does not match the column list.
    #[error("row arity mismatch for table {table}: {columns} columns, {values} values")]
    ArityMismatch {
        /// Table whose row failed to render.
        table: String,
        /// Number of columns in the section column list.
        columns: usize,
        /// Number of values supplied for the row.
        values: usize,
    },
    /// A table section was rendered with no columns.
    #[error("empty column list for table {table}")]
    EmptyColumns {
        /// Table whose section has no columns.
        table: String,
    },
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Deduplicates column names case-insensitively, preserving first-seen order.
#[must_use]
pub fn dedupe_columns(columns: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(columns.len());
    let mut result = Vec::with_capacity(columns.len());
    for column in columns {
        let folded = column.to_ascii_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        result.push(column.clone());
    }
    result
}

/// Renders one row-insert statement for a table section.
///
/// The caller is responsible for having validated `table` against the
/// catalog whitelist before rendering; values are made safe here via
/// [`encode`].
///
/// # Errors
///
/// Returns [`DumpError`] when the column list is empty or the row arity
/// does not match the column list.
pub fn render_insert(
    table: &str,
    columns: &[String],
    values: &[SqlValue],
) -> Result<String, DumpError> {
    if columns.is_empty() {
        return Err(DumpError::EmptyColumns {
            table: table.to_string(),
        });
    }
    if columns.len() != values.len() {
        return Err(DumpError::ArityMismatch {
            table: table.to_string(),
            columns: columns.len(),
            values: values.len(),
        });
    }
    let column_list = columns.join(", ");
    let value_list = values.iter().map(encode).collect::<Vec<_>>().join(", ");
    Ok(format!("INSERT INTO \"{table}\" ({column_list}) VALUES ({value_list});"))
}

/// Renders the dump header block (sentinel plus labeled lines).
#[must_use]
pub fn render_header(schema_version: &str, created_at: &str, machine_name: &str) -> String {
    format!(
        "{DUMP_SENTINEL}\n{SCHEMA_VERSION_LABEL} {schema_version}\n{CREATED_AT_LABEL} \
         {created_at}\n{MACHINE_NAME_LABEL} {machine_name}\n"
    )
}

/// Renders a table section marker line.
#[must_use]
pub fn render_table_marker(table: &str) -> String {
    format!("{TABLE_LABEL} {table} --")
}

/// Renders a per-table declared record count line.
#[must_use]
pub fn render_records_line(count: u64) -> String {
    format!("{RECORDS_LABEL} {count} --")
}

/// Renders the dump footer line with the declared total.
#[must_use]
pub fn render_footer(total: u64) -> String {
    format!("{FOOTER_LABEL} {total} total records --")
}

// ============================================================================
// SECTION: Tests
// ============================================================================
