// crates/timevault-engine/src/config.rs
// ============================================================================
// Module: Engine Configuration
// Description: Validated configuration for the backup engine.
// Purpose: Deserialize engine settings from TOML with safe defaults.
// Dependencies: serde, toml, crate::error
// ============================================================================

//! ## Overview
//! Configuration follows the workspace convention: a serde struct with
//! per-field defaults, explicit validation at construction boundaries, and a
//! TOML loader for host applications. Paths are validated for basic safety
//! limits before any connection is opened.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::EngineError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default retention horizon for swept dump files, in days.
const DEFAULT_RETENTION_DAYS: u32 = 30;
/// Default busy timeout for the `SQLite` connection (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the backup engine.
///
/// # Invariants
/// - `db_path` must resolve to a file path (not a directory).
/// - `retention_days` is at least 1.
/// - `busy_timeout_ms` is interpreted as milliseconds and is non-zero.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Path to the attendance `SQLite` database file.
    pub db_path: PathBuf,
    /// Directory receiving automatically named dump files.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    /// Retention horizon for the sweeper, in days.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl EngineConfig {
    /// Creates a configuration with defaults for everything but the database
    /// path.
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            backup_dir: default_backup_dir(),
            retention_days: default_retention_days(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    /// Loads and validates a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn from_toml_path(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|err| EngineError::Io(err.to_string()))?;
        let config: Self =
            toml::from_str(&text).map_err(|err| EngineError::Invalid(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates configuration limits.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Invalid`] on any violated limit.
    pub fn validate(&self) -> Result<(), EngineError> {
        validate_database_path(&self.db_path)?;
        if self.backup_dir.as_os_str().is_empty() {
            return Err(EngineError::Invalid("backup_dir must not be empty".to_string()));
        }
        if self.retention_days == 0 {
            return Err(EngineError::Invalid(
                "retention_days must be greater than zero".to_string(),
            ));
        }
        if self.busy_timeout_ms == 0 {
            return Err(EngineError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the default backup directory.
fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

/// Returns the default retention horizon in days.
const fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

/// Returns the default busy timeout in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Validates the database path for safety limits.
fn validate_database_path(path: &Path) -> Result<(), EngineError> {
    if path.as_os_str().is_empty() {
        return Err(EngineError::Invalid("db_path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(EngineError::Invalid("db_path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(EngineError::Invalid(
                "db_path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(EngineError::Invalid(
            "db_path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
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

    use std::path::PathBuf;

    use super::EngineConfig;
    use crate::error::EngineError;

    #[test]
    fn defaults_are_applied() {
        let config = EngineConfig::new("attendance.sqlite");
        assert_eq!(config.backup_dir, PathBuf::from("backups"));
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.busy_timeout_ms, 5_000);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_empty_database_path() {
        let config = EngineConfig::new("");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EngineError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_retention() {
        let mut config = EngineConfig::new("attendance.sqlite");
        config.retention_days = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EngineError::Invalid(_)));
    }

    #[test]
    fn parses_minimal_toml() {
        let parsed: EngineConfig = toml::from_str("db_path = \"attendance.sqlite\"").unwrap();
        assert_eq!(parsed.db_path, PathBuf::from("attendance.sqlite"));
        assert_eq!(parsed.retention_days, 30);
    }
}
