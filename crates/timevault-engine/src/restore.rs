// crates/timevault-engine/src/restore.rs
// ============================================================================
// Module: Restore Orchestrator
// Description: Transactional replay of a dump file into the live database.
// Purpose: All-or-nothing restore with per-row duplicate tolerance.
// Dependencies: rusqlite, serde, timevault-core
// ============================================================================

//! ## Overview
//! Restore runs as a phase sequence: validate the file, parse the dump, then
//! inside one transaction clear children-first, replay parents-first, and
//! repair identity sequences and settings singletons. A fatal error in any
//! transactional phase rolls the whole transaction back and reports the phase
//! it escaped from; the database is then byte-for-byte unchanged. Individual
//! row failures are never fatal: duplicate-key rows are counted as skipped
//! and other row errors are counted as failed with a bounded sample list.
//!
//! Foreign-key enforcement is toggled outside the transaction because the
//! pragma is a no-op while a transaction is open.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::Transaction;
use rusqlite::params;
use serde::Serialize;
use timevault_core::TableCatalog;
use timevault_core::dump::DUMP_SENTINEL;
use timevault_core::parser::DumpDocument;
use timevault_core::parser::parse;

use crate::error::EngineError;
use crate::error::RestorePhase;
use crate::writer::table_exists;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of row error messages retained in the outcome.
const MAX_ERROR_SAMPLES: usize = 10;
/// Extended result code for a primary-key constraint violation.
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
/// Extended result code for a unique-index constraint violation.
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Counters and findings from a committed restore.
///
/// # Invariants
/// - `applied + skipped + failed` equals the number of replayed statements
///   for tables present in the live schema.
/// - `error_samples` holds at most [`MAX_ERROR_SAMPLES`] entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreOutcome {
    /// Rows inserted successfully.
    pub applied: u64,
    /// Rows skipped as duplicates of existing keys.
    pub skipped: u64,
    /// Rows rejected for any other reason.
    pub failed: u64,
    /// Bounded sample of row error messages.
    pub error_samples: Vec<String>,
    /// Non-fatal findings from clearing and repair.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Orchestration
// ============================================================================

/// Restores a dump file into the database behind `connection`.
///
/// The optional `cancel` flag is honored only before the transaction opens;
/// once clearing begins, the restore runs to commit or rollback.
///
/// # Errors
///
/// Returns [`EngineError::RestoreFailed`] with the offending phase on any
/// fatal error; the database is unchanged in that case. Returns
/// [`EngineError::Cancelled`] when the flag is raised in time.
pub(crate) fn run_restore(
    connection: &mut Connection,
    catalog: &TableCatalog,
    source: &Path,
    cancel: Option<&AtomicBool>,
) -> Result<RestoreOutcome, EngineError> {
    let document = validate_and_parse(source)?;
    if is_cancelled(cancel) {
        return Err(EngineError::Cancelled);
    }
    connection
        .execute_batch("PRAGMA foreign_keys = OFF")
        .map_err(|err| fatal(RestorePhase::Clearing, &err.to_string()))?;
    let result = restore_within_transaction(connection, catalog, &document);
    // Re-enable enforcement whether or not the transaction survived.
    let enforce = connection.execute_batch("PRAGMA foreign_keys = ON");
    let mut outcome = result?;
    if let Err(err) = enforce {
        outcome.warnings.push(format!("failed to re-enable foreign keys: {err}"));
    }
    Ok(outcome)
}

/// Validates the source file and parses it into a dump document.
fn validate_and_parse(source: &Path) -> Result<DumpDocument, EngineError> {
    if !source.is_file() {
        return Err(fatal(
            RestorePhase::Validating,
            &format!("backup file not found: {}", source.display()),
        ));
    }
    let text = std::fs::read_to_string(source)
        .map_err(|err| fatal(RestorePhase::Validating, &err.to_string()))?;
    if !text.contains(DUMP_SENTINEL) {
        return Err(fatal(
            RestorePhase::Validating,
            "file does not carry the backup header marker",
        ));
    }
    let document = parse(&text);
    if document.declared_total.unwrap_or(0) > 0 && document.statement_count() == 0 {
        return Err(fatal(
            RestorePhase::Parsing,
            "records are declared but no replayable statements were found",
        ));
    }
    Ok(document)
}

/// Runs the clearing, loading, and repair phases inside one transaction.
fn restore_within_transaction(
    connection: &mut Connection,
    catalog: &TableCatalog,
    document: &DumpDocument,
) -> Result<RestoreOutcome, EngineError> {
    let tx = connection
        .transaction()
        .map_err(|err| fatal(RestorePhase::Clearing, &err.to_string()))?;
    let mut outcome = RestoreOutcome::default();
    let phases = clear_tables(&tx, catalog, &mut outcome)
        .and_then(|()| load_tables(&tx, catalog, document, &mut outcome))
        .and_then(|()| repair_database(&tx, catalog, &mut outcome));
    match phases {
        Ok(()) => {
            tx.commit().map_err(|err| fatal(RestorePhase::Repairing, &err.to_string()))?;
            Ok(outcome)
        }
        Err(err) => {
            // Rollback is best-effort; the phase error is what matters.
            let _ = tx.rollback();
            Err(err)
        }
    }
}

/// Empties every existing catalog table, children before parents.
fn clear_tables(
    tx: &Transaction<'_>,
    catalog: &TableCatalog,
    outcome: &mut RestoreOutcome,
) -> Result<(), EngineError> {
    for entry in catalog.tables_reversed() {
        if !exists_in_tx(tx, entry.name, RestorePhase::Clearing)? {
            outcome.warnings.push(format!("table {} absent from live schema", entry.name));
            continue;
        }
        tx.execute(&format!("DELETE FROM \"{}\"", entry.name), [])
            .map_err(|err| fatal(RestorePhase::Clearing, &err.to_string()))?;
        reset_sequence(tx, entry.name)?;
    }
    Ok(())
}

/// Removes a table's identity counter row, when the counter table exists.
fn reset_sequence(tx: &Transaction<'_>, table: &str) -> Result<(), EngineError> {
    if !exists_in_tx(tx, "sqlite_sequence", RestorePhase::Clearing)? {
        return Ok(());
    }
    tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1", params![table])
        .map_err(|err| fatal(RestorePhase::Clearing, &err.to_string()))?;
    Ok(())
}

/// Replays parsed statements table by table, parents before children.
fn load_tables(
    tx: &Transaction<'_>,
    catalog: &TableCatalog,
    document: &DumpDocument,
    outcome: &mut RestoreOutcome,
) -> Result<(), EngineError> {
    for entry in catalog.tables() {
        let statements = document.statements_for(entry.name);
        if statements.is_empty() {
            continue;
        }
        if !exists_in_tx(tx, entry.name, RestorePhase::Loading)? {
            continue;
        }
        for statement in statements {
            replay_statement(tx, statement, outcome);
        }
    }
    Ok(())
}

/// Replays one row statement, folding the result into the counters.
fn replay_statement(tx: &Transaction<'_>, statement: &str, outcome: &mut RestoreOutcome) {
    match tx.execute(statement, []) {
        Ok(_) => outcome.applied = outcome.applied.saturating_add(1),
        Err(err) if is_duplicate_key(&err) => {
            outcome.skipped = outcome.skipped.saturating_add(1);
        }
        Err(err) => {
            outcome.failed = outcome.failed.saturating_add(1);
            if outcome.error_samples.len() < MAX_ERROR_SAMPLES {
                outcome.error_samples.push(err.to_string());
            }
        }
    }
}

/// Returns whether a replay error is a primary-key or unique-index collision.
fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && (failure.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY
                    || failure.extended_code == SQLITE_CONSTRAINT_UNIQUE)
        }
        _ => false,
    }
}

/// Repairs identity sequences and reseeds required settings singletons.
fn repair_database(
    tx: &Transaction<'_>,
    catalog: &TableCatalog,
    outcome: &mut RestoreOutcome,
) -> Result<(), EngineError> {
    for entry in catalog.tables() {
        let Some(identity) = entry.identity_column else {
            continue;
        };
        if let Err(err) = align_sequence(tx, entry.name, identity) {
            outcome.warnings.push(format!("sequence repair skipped for {}: {err}", entry.name));
        }
    }
    for entry in catalog.singleton_tables() {
        if let Err(err) = seed_singleton(tx, entry.name) {
            outcome.warnings.push(format!("singleton seed skipped for {}: {err}", entry.name));
        }
    }
    Ok(())
}

/// Inserts the default settings row when a singleton table is empty.
///
/// Shared with schema bootstrap, which seeds fresh databases the same way.
pub(crate) fn seed_singleton(connection: &Connection, table: &str) -> Result<(), EngineError> {
    if !table_exists(connection, table)? {
        return Ok(());
    }
    let count: i64 = connection
        .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| row.get(0))
        .map_err(|err| EngineError::Db(err.to_string()))?;
    if count > 0 {
        return Ok(());
    }
    let seed = match table {
        "backup_settings" => {
            "INSERT INTO backup_settings (auto_backup_enabled, backup_time, retention_days) \
             VALUES (1, '22:00:00', 30)"
        }
        "sync_settings" => {
            "INSERT INTO sync_settings (sync_enabled, sync_interval_minutes) VALUES (0, 15)"
        }
        _ => return Ok(()),
    };
    connection.execute(seed, []).map_err(|err| EngineError::Db(err.to_string()))?;
    Ok(())
}

/// Aligns a table's identity counter with its current maximum key.
///
/// The counter stores the last-used value, so the next generated key is
/// `max + 1`.
fn align_sequence(
    tx: &Transaction<'_>,
    table: &str,
    identity_column: &str,
) -> Result<(), EngineError> {
    if !exists_in_tx(tx, table, RestorePhase::Repairing)?
        || !exists_in_tx(tx, "sqlite_sequence", RestorePhase::Repairing)?
    {
        return Ok(());
    }
    let maximum: Option<i64> = tx
        .query_row(
            &format!("SELECT MAX(\"{identity_column}\") FROM \"{table}\""),
            [],
            |row| row.get(0),
        )
        .map_err(|err| EngineError::Db(err.to_string()))?;
    let Some(maximum) = maximum else {
        return Ok(());
    };
    // The counter table carries no unique index, so upsert is unavailable.
    let updated = tx
        .execute("UPDATE sqlite_sequence SET seq = ?2 WHERE name = ?1", params![table, maximum])
        .map_err(|err| EngineError::Db(err.to_string()))?;
    if updated == 0 {
        tx.execute(
            "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2)",
            params![table, maximum],
        )
        .map_err(|err| EngineError::Db(err.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks table existence through the transaction handle.
fn exists_in_tx(
    tx: &Transaction<'_>,
    name: &str,
    phase: RestorePhase,
) -> Result<bool, EngineError> {
    table_exists(tx, name).map_err(|err| fatal(phase, &err.to_string()))
}

/// Builds a phase-tagged fatal restore error.
fn fatal(phase: RestorePhase, message: &str) -> EngineError {
    EngineError::RestoreFailed {
        phase,
        message: message.to_string(),
    }
}

/// Reads the cancel flag, treating absence as not cancelled.
fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::SeqCst))
}
