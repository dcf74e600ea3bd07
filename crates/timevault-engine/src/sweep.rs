// crates/timevault-engine/src/sweep.rs
// ============================================================================
// Module: Retention Sweeper
// Description: Age-based deletion of automatically named dump files.
// Purpose: Keep the backup directory bounded without touching foreign files.
// Dependencies: std::fs, serde
// ============================================================================

//! ## Overview
//! The sweeper deletes dump files older than the retention horizon from the
//! backup directory. Only files matching the engine's own naming pattern are
//! candidates; anything else in the directory is ignored. Per-file failures
//! are collected as warnings so one stubborn file never aborts the sweep.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::time::Duration;
use std::time::SystemTime;

use serde::Serialize;

use crate::error::EngineError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Filename prefix for automatically named dump files.
pub const DUMP_FILE_PREFIX: &str = "timevault-backup-";
/// Filename suffix for dump files.
pub const DUMP_FILE_SUFFIX: &str = ".sql";
/// Seconds in one retention day.
const SECONDS_PER_DAY: u64 = 86_400;

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Counters and findings from one retention sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepOutcome {
    /// Files deleted this sweep.
    pub deleted: u64,
    /// Matching files young enough to keep.
    pub retained: u64,
    /// Per-file failures that did not abort the sweep.
    pub warnings: Vec<String>,
}

// ============================================================================
// SECTION: Sweep
// ============================================================================

/// Deletes engine-named dump files older than `retention_days`.
///
/// A missing backup directory is treated as an empty one.
///
/// # Errors
///
/// Returns [`EngineError::Io`] only when the directory itself cannot be
/// listed; individual file failures land in the outcome warnings.
pub(crate) fn sweep_old_dumps(
    backup_dir: &Path,
    retention_days: u32,
) -> Result<SweepOutcome, EngineError> {
    let mut outcome = SweepOutcome::default();
    if !backup_dir.is_dir() {
        return Ok(outcome);
    }
    let horizon = Duration::from_secs(u64::from(retention_days) * SECONDS_PER_DAY);
    let now = SystemTime::now();
    let entries = fs::read_dir(backup_dir).map_err(|err| EngineError::Io(err.to_string()))?;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                outcome.warnings.push(format!("unreadable directory entry: {err}"));
                continue;
            }
        };
        let path = entry.path();
        if !is_engine_dump(&path) {
            continue;
        }
        match file_age(&path, now) {
            Ok(age) if age > horizon => match fs::remove_file(&path) {
                Ok(()) => outcome.deleted = outcome.deleted.saturating_add(1),
                Err(err) => outcome
                    .warnings
                    .push(format!("failed to delete {}: {err}", path.display())),
            },
            Ok(_) => outcome.retained = outcome.retained.saturating_add(1),
            Err(err) => {
                outcome.warnings.push(format!("failed to stat {}: {err}", path.display()));
            }
        }
    }
    Ok(outcome)
}

/// Returns whether a path carries the engine's own dump naming pattern.
fn is_engine_dump(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    path.file_name().and_then(|name| name.to_str()).is_some_and(|name| {
        name.starts_with(DUMP_FILE_PREFIX) && name.ends_with(DUMP_FILE_SUFFIX)
    })
}

/// Returns a file's age, preferring creation time over modification time.
fn file_age(path: &Path, now: SystemTime) -> Result<Duration, EngineError> {
    let metadata = fs::metadata(path).map_err(|err| EngineError::Io(err.to_string()))?;
    let stamp = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map_err(|err| EngineError::Io(err.to_string()))?;
    Ok(now.duration_since(stamp).unwrap_or(Duration::ZERO))
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

    use std::fs;

    use super::sweep_old_dumps;

    #[test]
    fn missing_directory_is_empty_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        let outcome = sweep_old_dumps(&missing, 30).unwrap();
        assert_eq!(outcome.deleted, 0);
        assert_eq!(outcome.retained, 0);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn retains_fresh_dumps_and_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("timevault-backup-20260301-220000.sql"), "fresh").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a dump").unwrap();
        fs::write(dir.path().join("other-backup.sql"), "foreign prefix").unwrap();
        let outcome = sweep_old_dumps(dir.path(), 30).unwrap();
        assert_eq!(outcome.deleted, 0);
        assert_eq!(outcome.retained, 1);
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("other-backup.sql").exists());
    }

    #[test]
    fn zero_age_survives_any_horizon() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("timevault-backup-20260301-220000.sql"), "fresh").unwrap();
        let outcome = sweep_old_dumps(dir.path(), 1).unwrap();
        assert_eq!(outcome.retained, 1);
        assert_eq!(outcome.deleted, 0);
    }
}
