// crates/timevault-engine/src/writer.rs
// ============================================================================
// Module: Dump Writer
// Description: Full-database capture into the portable dump text format.
// Purpose: Emit one insert statement per row in catalog dependency order.
// Dependencies: rusqlite, time, timevault-core
// ============================================================================

//! ## Overview
//! The writer walks the catalog parents-first, selects every row of every
//! existing table, encodes each column through the value encoder, and builds
//! the complete artifact in memory before touching the destination file. A
//! database error anywhere aborts the whole write, so a file carrying the
//! footer line is always the product of a successful full pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use rusqlite::Connection;
use rusqlite::params;
use rusqlite::types::ValueRef;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use timevault_core::SqlValue;
use timevault_core::TableCatalog;
use timevault_core::dump::BOM;
use timevault_core::dump::SCHEMA_VERSION;
use timevault_core::dump::dedupe_columns;
use timevault_core::dump::render_footer;
use timevault_core::dump::render_header;
use timevault_core::dump::render_insert;
use timevault_core::dump::render_records_line;
use timevault_core::dump::render_table_marker;
use timevault_core::value::format_timestamp;

use crate::error::EngineError;

// ============================================================================
// SECTION: Capture
// ============================================================================

/// Captures every catalog table into dump text and writes `destination`.
///
/// Returns the total record count on success.
///
/// # Errors
///
/// Returns [`EngineError`] on any database or filesystem failure; no partial
/// file carries a footer.
pub(crate) fn write_dump(
    connection: &Connection,
    catalog: &TableCatalog,
    destination: &Path,
) -> Result<u64, EngineError> {
    ensure_parent_dir(destination)?;
    let mut text = String::new();
    text.push(BOM);
    text.push_str(&render_header(SCHEMA_VERSION, &current_timestamp_text(), &machine_name()));
    let mut total: u64 = 0;
    for entry in catalog.tables() {
        if !table_exists(connection, entry.name)? {
            // Partially-migrated databases simply lack some tables.
            continue;
        }
        total = total.saturating_add(capture_table(connection, entry.name, &mut text)?);
    }
    text.push_str(&render_footer(total));
    text.push('\n');
    fs::write(destination, text).map_err(|err| EngineError::Io(err.to_string()))?;
    Ok(total)
}

/// Captures one table section, returning its row count.
fn capture_table(
    connection: &Connection,
    table: &str,
    text: &mut String,
) -> Result<u64, EngineError> {
    text.push_str(&render_table_marker(table));
    text.push('\n');
    let mut statement = connection
        .prepare(&format!("SELECT * FROM \"{table}\""))
        .map_err(|err| EngineError::Db(err.to_string()))?;
    let all_columns: Vec<String> =
        statement.column_names().iter().map(ToString::to_string).collect();
    let columns = dedupe_columns(&all_columns);
    let indices: Vec<usize> = columns
        .iter()
        .map(|column| {
            all_columns.iter().position(|name| name.eq_ignore_ascii_case(column)).unwrap_or(0)
        })
        .collect();
    let mut count: u64 = 0;
    let mut rows = statement.query([]).map_err(|err| EngineError::Db(err.to_string()))?;
    while let Some(row) = rows.next().map_err(|err| EngineError::Db(err.to_string()))? {
        let mut values = Vec::with_capacity(indices.len());
        for index in &indices {
            let value =
                row.get_ref(*index).map_err(|err| EngineError::Db(err.to_string()))?;
            values.push(column_value(value));
        }
        let line = render_insert(table, &columns, &values)
            .map_err(|err| EngineError::Invalid(err.to_string()))?;
        text.push_str(&line);
        text.push('\n');
        count = count.saturating_add(1);
    }
    text.push_str(&render_records_line(count));
    text.push('\n');
    Ok(count)
}

/// Maps a raw `SQLite` column value into the dump value model.
fn column_value(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(number) => SqlValue::Integer(number),
        ValueRef::Real(number) => SqlValue::Real(number),
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => SqlValue::Blob(bytes.to_vec()),
    }
}

// ============================================================================
// SECTION: Side Effects
// ============================================================================

/// Records the last-backup timestamp in the settings singleton.
///
/// Guarded: a database missing the settings table is not an error.
///
/// # Errors
///
/// Returns [`EngineError`] when the settings row exists but cannot be
/// updated; callers downgrade this to a warning.
pub(crate) fn record_last_backup(
    connection: &Connection,
    stamp: &str,
) -> Result<(), EngineError> {
    if !table_exists(connection, "backup_settings")? {
        return Ok(());
    }
    connection
        .execute("UPDATE backup_settings SET last_backup_at = ?1", params![stamp])
        .map_err(|err| EngineError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns whether a table exists in the live schema (case-insensitive).
pub(crate) fn table_exists(connection: &Connection, name: &str) -> Result<bool, EngineError> {
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND lower(name) = \
             lower(?1)",
            params![name],
            |row| row.get(0),
        )
        .map_err(|err| EngineError::Db(err.to_string()))?;
    Ok(count > 0)
}

/// Ensures the parent directory for the destination exists.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), EngineError> {
    let Some(parent) = path.parent() else {
        return Err(EngineError::Io("destination path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(parent).map_err(|err| EngineError::Io(err.to_string()))
}

/// Returns the current wall-clock time as `YYYY-MM-DD HH:MM:SS`.
pub(crate) fn current_timestamp_text() -> String {
    let now = OffsetDateTime::now_utc();
    format_timestamp(PrimitiveDateTime::new(now.date(), now.time()))
}

/// Returns a compact filename-safe capture stamp (`yyyyMMdd-HHmmss`).
pub(crate) fn current_file_stamp() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}-{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Returns the source host identifier for the dump header.
pub(crate) fn machine_name() -> String {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}
