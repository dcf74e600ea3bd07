// crates/timevault-engine/src/lib.rs
// ============================================================================
// Module: Timevault Engine
// Description: SQLite-backed backup lifecycle for the attendance database.
// Purpose: Dump capture, transactional restore, verification, and retention.
// Dependencies: rusqlite, serde, thiserror, time, timevault-core, toml
// ============================================================================

//! ## Overview
//! `timevault-engine` binds the database-free primitives of `timevault-core`
//! to a live `SQLite` connection. The [`engine::BackupEngine`] facade owns
//! the connection and exposes the lifecycle operations: full-dump capture,
//! all-or-nothing transactional restore with duplicate tolerance, read-only
//! dump verification, and age-based retention sweeping of the backup
//! directory. Configuration is loaded from TOML with validated limits.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod engine;
pub mod error;
mod restore;
mod sweep;
mod writer;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use config::EngineConfig;
pub use engine::BackupEngine;
pub use engine::BackupOutcome;
pub use error::EngineError;
pub use error::RestorePhase;
pub use restore::RestoreOutcome;
pub use sweep::DUMP_FILE_PREFIX;
pub use sweep::DUMP_FILE_SUFFIX;
pub use sweep::SweepOutcome;
