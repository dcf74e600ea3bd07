// crates/timevault-engine/src/error.rs
// ============================================================================
// Module: Engine Errors
// Description: Error taxonomy for dump, restore, and sweep operations.
// Purpose: Separate operator-recoverable input errors from fatal failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Input errors surface before any database mutation and are recoverable by
//! supplying a different file; transaction-fatal errors carry the restore
//! phase they escaped from and always leave the database unchanged. Per-row
//! replay errors never appear here — they are absorbed into the restore
//! outcome counters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Restore Phases
// ============================================================================

/// Restore state machine phases.
///
/// # Invariants
/// - `Committed` and `RolledBack` are terminal.
/// - No transaction exists before `Clearing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePhase {
    /// No restore in progress.
    Idle,
    /// File existence and header checks.
    Validating,
    /// Dump text parsing.
    Parsing,
    /// Children-first table truncation inside the transaction.
    Clearing,
    /// Parents-first statement replay inside the transaction.
    Loading,
    /// Sequence repair and singleton seeding inside the transaction.
    Repairing,
    /// Transaction committed; restore succeeded.
    Committed,
    /// Transaction rolled back; database unchanged.
    RolledBack,
}

impl RestorePhase {
    /// Returns the stable lowercase phase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Parsing => "parsing",
            Self::Clearing => "clearing",
            Self::Loading => "loading",
            Self::Repairing => "repairing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for RestorePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Backup engine errors.
///
/// # Invariants
/// - Error messages avoid embedding raw row data.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    /// Filesystem error.
    #[error("backup engine io error: {0}")]
    Io(String),
    /// Database error.
    #[error("backup engine db error: {0}")]
    Db(String),
    /// Invalid configuration or input.
    #[error("backup engine invalid input: {0}")]
    Invalid(String),
    /// A restore aborted and rolled back; the database is unchanged.
    #[error("restore failed during {phase}: {message}")]
    RestoreFailed {
        /// Phase the fatal error escaped from.
        phase: RestorePhase,
        /// Wrapped failure context.
        message: String,
    },
    /// A restore was cancelled before its transaction opened.
    #[error("restore cancelled before any change was applied")]
    Cancelled,
}
