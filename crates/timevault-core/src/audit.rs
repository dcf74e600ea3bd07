// crates/timevault-core/src/audit.rs
// ============================================================================
// Module: Audit Sink Interface
// Description: Backend-agnostic audit logging contract.
// Purpose: Record dump/restore/sweep operations without coupling to a store.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The engine reports completed operations to an [`AuditSink`]. Sinks are
//! best-effort collaborators: the engine calls them after success but never
//! depends on them for correctness, so implementations must not fail loudly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Event Model
// ============================================================================

/// Action classification for audit events.
///
/// # Invariants
/// - Variants are stable for downstream filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A dump file was written successfully.
    BackupCreated,
    /// A dump file was restored successfully.
    BackupRestored,
    /// Old dump files were swept from the backup directory.
    BackupPruned,
}

/// One structured audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Action classification.
    pub action: AuditAction,
    /// Affected table, when the event is table-scoped.
    pub table_name: Option<String>,
    /// Affected record identifier, when applicable.
    pub record_id: Option<i64>,
    /// Previous value, when applicable.
    pub old_value: Option<String>,
    /// New value, when applicable.
    pub new_value: Option<String>,
    /// Human-readable summary of the operation.
    pub description: String,
}

impl AuditEvent {
    /// Creates an event carrying only an action and description.
    #[must_use]
    pub fn new(action: AuditAction, description: impl Into<String>) -> Self {
        Self {
            action,
            table_name: None,
            record_id: None,
            old_value: None,
            new_value: None,
            description: description.into(),
        }
    }
}

// ============================================================================
// SECTION: Sink Contract
// ============================================================================

/// Best-effort audit sink.
pub trait AuditSink: Send + Sync {
    /// Records one audit event. Implementations must not panic.
    fn log(&self, event: AuditEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn log(&self, _event: AuditEvent) {}
}

/// In-memory sink retaining events for inspection (used by tests and hosts
/// that forward events elsewhere).
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn log(&self, event: AuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
