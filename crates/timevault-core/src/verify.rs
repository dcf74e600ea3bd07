// crates/timevault-core/src/verify.rs
// ============================================================================
// Module: Dump Verifier
// Description: Read-only structural and statistical audit of a dump file.
// Purpose: Let an operator judge a dump before an irreversible restore.
// Dependencies: crate::catalog, crate::dump, crate::parser, serde
// ============================================================================

//! ## Overview
//! Verification opens no database connection. Fatal conditions short-circuit
//! in a fixed order (missing file, empty file, missing sentinel, declared
//! records with zero parseable statements); everything else is a warning.
//! Overall validity is exactly "no fatal errors accumulated" — warnings never
//! flip a dump to invalid.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::catalog::TableCatalog;
use crate::dump::SCHEMA_VERSION;
use crate::parser::DumpDocument;
use crate::parser::parse;

// ============================================================================
// SECTION: Result Model
// ============================================================================

/// Declared-versus-actual record counts for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCount {
    /// Lowercase table name.
    pub table: String,
    /// Count declared by the table section trailer, when present.
    pub declared: Option<u64>,
    /// Number of statements actually parsed for the table.
    pub actual: u64,
}

/// Outcome of a read-only dump verification.
///
/// # Invariants
/// - `is_valid` is true exactly when `errors` is empty.
/// - Warnings are advisory and never invalidate a dump.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Overall validity flag (no fatal errors).
    pub is_valid: bool,
    /// Whether the dump sentinel header was found.
    pub header_present: bool,
    /// Total statements parsed across all tables.
    pub statements_parsed: u64,
    /// Declared total record count from the footer.
    pub declared_total: Option<u64>,
    /// Declared schema version from the header.
    pub schema_version: Option<String>,
    /// Per-table declared and actual counts.
    pub table_counts: Vec<TableCount>,
    /// Non-fatal findings.
    pub warnings: Vec<String>,
    /// Fatal findings.
    pub errors: Vec<String>,
}

impl VerificationResult {
    /// Records a fatal finding.
    fn fatal(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    /// Records a non-fatal finding.
    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Verifies a dump file without touching the database.
///
/// Fatal checks short-circuit in order: file existence, non-zero size,
/// sentinel presence, and at least one parseable statement when records are
/// declared. Non-fatal checks (count equality, essential-table emptiness,
/// schema-version drift) run whenever the fatal gate passes.
#[must_use]
pub fn verify(path: &Path, catalog: &TableCatalog) -> VerificationResult {
    let mut result = VerificationResult {
        is_valid: true,
        ..VerificationResult::default()
    };
    if !path.is_file() {
        result.fatal(format!("backup file not found: {}", path.display()));
        return result;
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            result.fatal(format!("backup file unreadable: {err}"));
            return result;
        }
    };
    if text.trim_start_matches('\u{feff}').trim().is_empty() {
        result.fatal("backup file is empty");
        return result;
    }
    let document = parse(&text);
    result.header_present = document.sentinel_present;
    result.statements_parsed = document.statement_count();
    result.declared_total = document.declared_total;
    result.schema_version = document.header.schema_version.clone();
    if !document.sentinel_present {
        result.fatal("backup header is missing or unparseable");
        return result;
    }
    if document.declared_total.unwrap_or(0) > 0 && result.statements_parsed == 0 {
        result.fatal("records are declared but no valid statements were found");
        return result;
    }
    audit_counts(&document, &mut result);
    audit_essential_tables(&document, catalog, &mut result);
    audit_schema_version(&document, &mut result);
    result
}

/// Compares declared counts against parsed statements, per table and total.
fn audit_counts(document: &DumpDocument, result: &mut VerificationResult) {
    let mut tables: Vec<String> = document.tables.keys().cloned().collect();
    for declared_only in document.declared_counts.keys() {
        if !tables.contains(declared_only) {
            tables.push(declared_only.clone());
        }
    }
    tables.sort();
    for table in tables {
        let declared = document.declared_counts.get(&table).copied();
        let actual = u64::try_from(document.statements_for(&table).len()).unwrap_or(u64::MAX);
        if let Some(expected) = declared
            && expected != actual
        {
            result.warn(format!(
                "table {table}: declared {expected} records but parsed {actual} statements"
            ));
        }
        result.table_counts.push(TableCount {
            table,
            declared,
            actual,
        });
    }
    if let Some(declared_total) = document.declared_total
        && declared_total != result.statements_parsed
    {
        result.warn(format!(
            "footer declares {declared_total} records but {} statements were parsed",
            result.statements_parsed
        ));
    }
}

/// Warns when an essential table would restore empty.
fn audit_essential_tables(
    document: &DumpDocument,
    catalog: &TableCatalog,
    result: &mut VerificationResult,
) {
    for entry in catalog.essential_tables() {
        if document.statements_for(entry.name).is_empty() {
            result.warn(format!("essential table {} has no records in this dump", entry.name));
        }
    }
}

/// Warns on schema-version drift against the engine's current version.
fn audit_schema_version(document: &DumpDocument, result: &mut VerificationResult) {
    match document.header.schema_version.as_deref() {
        None => result.warn("dump does not declare a schema version"),
        Some(version) if version != SCHEMA_VERSION => {
            result.warn(format!(
                "dump schema version {version} differs from engine version {SCHEMA_VERSION}"
            ));
        }
        Some(_) => {}
    }
}
