// crates/timevault-engine/src/engine.rs
// ============================================================================
// Module: Backup Engine
// Description: Connection-owning facade over dump, restore, verify, sweep.
// Purpose: One validated entry point for every backup lifecycle operation.
// Dependencies: rusqlite, serde, timevault-core, crate modules
// ============================================================================

//! ## Overview
//! [`BackupEngine`] owns the `SQLite` connection behind a mutex and exposes
//! the four lifecycle operations: capture a dump, restore a dump, verify a
//! dump read-only, and sweep expired dumps. Construction validates the
//! configuration, opens the connection with the workspace pragma set, and
//! bootstraps any missing schema so a fresh database is immediately usable.
//! Completed operations are reported to the configured audit sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;

use rusqlite::Connection;
use serde::Serialize;
use timevault_core::AuditAction;
use timevault_core::AuditEvent;
use timevault_core::AuditSink;
use timevault_core::NoopAuditSink;
use timevault_core::TableCatalog;
use timevault_core::VerificationResult;
use timevault_core::verify;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::restore::RestoreOutcome;
use crate::restore::run_restore;
use crate::restore::seed_singleton;
use crate::sweep::DUMP_FILE_PREFIX;
use crate::sweep::DUMP_FILE_SUFFIX;
use crate::sweep::SweepOutcome;
use crate::sweep::sweep_old_dumps;
use crate::writer::current_file_stamp;
use crate::writer::current_timestamp_text;
use crate::writer::ensure_parent_dir;
use crate::writer::record_last_backup;
use crate::writer::write_dump;

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Attendance schema bootstrap.
///
/// Every table uses an auto-increment identity key so the sequence counter
/// table exists and restore can repair it.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS departments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS shifts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS machines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    ip_address TEXT,
    port INTEGER,
    location TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);
CREATE TABLE IF NOT EXISTS holidays (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    holiday_date TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    badge_number TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    department_id INTEGER REFERENCES departments(id),
    shift_id INTEGER REFERENCES shifts(id),
    is_active INTEGER NOT NULL DEFAULT 1
);
CREATE TABLE IF NOT EXISTS attendance_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    machine_id INTEGER REFERENCES machines(id),
    punch_time TEXT NOT NULL,
    punch_type TEXT
);
CREATE TABLE IF NOT EXISTS attendance_exceptions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    exception_date TEXT NOT NULL,
    exception_type TEXT NOT NULL,
    note TEXT
);
CREATE TABLE IF NOT EXISTS leave_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    leave_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending'
);
CREATE TABLE IF NOT EXISTS audit_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER REFERENCES users(id),
    action TEXT NOT NULL,
    table_name TEXT,
    record_id INTEGER,
    old_value TEXT,
    new_value TEXT,
    created_at TEXT
);
CREATE TABLE IF NOT EXISTS backup_settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    auto_backup_enabled INTEGER NOT NULL DEFAULT 1,
    backup_time TEXT NOT NULL DEFAULT '22:00:00',
    retention_days INTEGER NOT NULL DEFAULT 30,
    last_backup_at TEXT
);
CREATE TABLE IF NOT EXISTS sync_settings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sync_enabled INTEGER NOT NULL DEFAULT 0,
    sync_interval_minutes INTEGER NOT NULL DEFAULT 15
);
";

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Summary of one completed dump capture.
#[derive(Debug, Clone, Serialize)]
pub struct BackupOutcome {
    /// Path of the written dump file.
    pub path: PathBuf,
    /// Total records captured across all tables.
    pub records: u64,
    /// Non-fatal findings from post-capture bookkeeping.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Backup engine facade owning one database connection.
///
/// # Invariants
/// - The connection is only reached through the mutex; operations are
///   serialized.
/// - Every table name interpolated into SQL comes from the catalog whitelist.
pub struct BackupEngine {
    /// Validated engine configuration.
    config: EngineConfig,
    /// Dependency-ordered table catalog.
    catalog: TableCatalog,
    /// Serialized database handle.
    connection: Mutex<Connection>,
    /// Best-effort operation reporter.
    audit: Arc<dyn AuditSink>,
}

impl BackupEngine {
    /// Opens the engine with a discarding audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the configuration is invalid or the
    /// database cannot be opened and bootstrapped.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_audit(config, Arc::new(NoopAuditSink))
    }

    /// Opens the engine with the supplied audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the configuration is invalid or the
    /// database cannot be opened and bootstrapped.
    pub fn with_audit(
        config: EngineConfig,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        ensure_parent_dir(&config.db_path)?;
        let connection = open_connection(&config)?;
        let catalog = TableCatalog::attendance();
        bootstrap_schema(&connection, &catalog)?;
        Ok(Self {
            config,
            catalog,
            connection: Mutex::new(connection),
            audit,
        })
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the table catalog in use.
    #[must_use]
    pub const fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    /// Captures a full dump into `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on any database or filesystem failure; no
    /// partial file carries the completion footer.
    pub fn create_backup(&self, destination: &Path) -> Result<BackupOutcome, EngineError> {
        let connection = self.lock_connection()?;
        let records = write_dump(&connection, &self.catalog, destination)?;
        let mut warnings = Vec::new();
        if let Err(err) = record_last_backup(&connection, &current_timestamp_text()) {
            warnings.push(format!("last-backup stamp not recorded: {err}"));
        }
        drop(connection);
        self.audit.log(AuditEvent::new(
            AuditAction::BackupCreated,
            format!("captured {records} records to {}", destination.display()),
        ));
        Ok(BackupOutcome {
            path: destination.to_path_buf(),
            records,
            warnings,
        })
    }

    /// Captures a full dump into the backup directory under an
    /// automatically generated timestamped name.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] on any database or filesystem failure.
    pub fn create_backup_auto(&self) -> Result<BackupOutcome, EngineError> {
        let name = format!("{DUMP_FILE_PREFIX}{}{DUMP_FILE_SUFFIX}", current_file_stamp());
        let destination = self.config.backup_dir.join(name);
        self.create_backup(&destination)
    }

    /// Restores a dump file, replacing all current data transactionally.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RestoreFailed`] on any fatal phase error; the
    /// database is unchanged in that case.
    pub fn restore_backup(&self, source: &Path) -> Result<RestoreOutcome, EngineError> {
        self.restore_backup_cancellable(source, None)
    }

    /// Restores a dump file, honoring a cancel flag before mutation begins.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] when the flag is raised before the
    /// transaction opens, and [`EngineError::RestoreFailed`] on fatal phase
    /// errors.
    pub fn restore_backup_cancellable(
        &self,
        source: &Path,
        cancel: Option<&AtomicBool>,
    ) -> Result<RestoreOutcome, EngineError> {
        let mut connection = self.lock_connection()?;
        let outcome = run_restore(&mut connection, &self.catalog, source, cancel)?;
        drop(connection);
        self.audit.log(AuditEvent::new(
            AuditAction::BackupRestored,
            format!(
                "restored {} (applied {}, skipped {}, failed {})",
                source.display(),
                outcome.applied,
                outcome.skipped,
                outcome.failed
            ),
        ));
        Ok(outcome)
    }

    /// Verifies a dump file read-only, without touching the database.
    #[must_use]
    pub fn verify_backup(&self, source: &Path) -> VerificationResult {
        verify(source, &self.catalog)
    }

    /// Sweeps expired engine-named dump files from the backup directory.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] only when the backup directory cannot be
    /// listed.
    pub fn delete_old_backups(&self) -> Result<SweepOutcome, EngineError> {
        let outcome = sweep_old_dumps(&self.config.backup_dir, self.config.retention_days)?;
        if outcome.deleted > 0 {
            self.audit.log(AuditEvent::new(
                AuditAction::BackupPruned,
                format!(
                    "deleted {} dump files older than {} days",
                    outcome.deleted, self.config.retention_days
                ),
            ));
        }
        Ok(outcome)
    }

    /// Locks the connection, translating poisoning into a database error.
    fn lock_connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, EngineError> {
        self.connection
            .lock()
            .map_err(|_| EngineError::Db("connection mutex poisoned".to_string()))
    }
}

// ============================================================================
// SECTION: Bootstrap
// ============================================================================

/// Opens the database connection with the standard pragma set.
fn open_connection(config: &EngineConfig) -> Result<Connection, EngineError> {
    let connection =
        Connection::open(&config.db_path).map_err(|err| EngineError::Db(err.to_string()))?;
    let pragmas = format!(
        "PRAGMA foreign_keys = ON;\nPRAGMA busy_timeout = {};",
        config.busy_timeout_ms
    );
    connection.execute_batch(&pragmas).map_err(|err| EngineError::Db(err.to_string()))?;
    Ok(connection)
}

/// Creates any missing attendance tables and seeds the settings singletons.
fn bootstrap_schema(
    connection: &Connection,
    catalog: &TableCatalog,
) -> Result<(), EngineError> {
    connection.execute_batch(SCHEMA_SQL).map_err(|err| EngineError::Db(err.to_string()))?;
    for entry in catalog.singleton_tables() {
        seed_singleton(connection, entry.name)?;
    }
    Ok(())
}
