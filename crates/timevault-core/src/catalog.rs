// crates/timevault-core/src/catalog.rs
// ============================================================================
// Module: Table Catalog
// Description: Fixed dependency-ordered table list for capture and restore.
// Purpose: Provide restore-safe table ordering and a name whitelist.
// Dependencies: (none)
// ============================================================================

//! ## Overview
//! The catalog is the single source of truth for which tables participate in
//! a backup and in which order they must be captured, cleared, and reloaded.
//! The order is domain knowledge asserted at build time, never inferred from
//! schema introspection: for every foreign key from table A to table B,
//! B's rank is strictly less than A's. The catalog also acts as the whitelist
//! consulted before any table name is interpolated into generated SQL.

// ============================================================================
// SECTION: Entry
// ============================================================================

/// A single catalog table with its restore-relevant attributes.
///
/// # Invariants
/// - `name` is a lowercase SQL identifier with no quoting required.
/// - `rank` is unique within a catalog and reflects dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Table name as it appears in the live schema.
    pub name: &'static str,
    /// Dependency rank; parents carry strictly lower ranks than children.
    pub rank: usize,
    /// Auto-increment identity column repaired after restore, when present.
    pub identity_column: Option<&'static str>,
    /// Whether emptiness after restore is worth a verifier warning.
    pub essential: bool,
    /// Whether exactly one settings row must exist after restore.
    pub singleton: bool,
}

/// Foreign-key edges (child, parent) declared by the attendance schema.
///
/// Every edge listed here must be consistent with [`TableCatalog::attendance`]
/// ranks; the catalog unit tests replay each edge explicitly.
pub const FOREIGN_KEY_EDGES: &[(&str, &str)] = &[
    ("users", "departments"),
    ("users", "shifts"),
    ("attendance_logs", "users"),
    ("attendance_logs", "machines"),
    ("attendance_exceptions", "users"),
    ("leave_requests", "users"),
    ("audit_logs", "users"),
];

/// Hand-maintained dependency-ordered table list for the attendance schema.
const ATTENDANCE_TABLES: &[CatalogEntry] = &[
    CatalogEntry {
        name: "departments",
        rank: 0,
        identity_column: Some("id"),
        essential: true,
        singleton: false,
    },
    CatalogEntry {
        name: "shifts",
        rank: 1,
        identity_column: Some("id"),
        essential: false,
        singleton: false,
    },
    CatalogEntry {
        name: "machines",
        rank: 2,
        identity_column: Some("id"),
        essential: false,
        singleton: false,
    },
    CatalogEntry {
        name: "holidays",
        rank: 3,
        identity_column: Some("id"),
        essential: false,
        singleton: false,
    },
    CatalogEntry {
        name: "users",
        rank: 4,
        identity_column: Some("id"),
        essential: true,
        singleton: false,
    },
    CatalogEntry {
        name: "attendance_logs",
        rank: 5,
        identity_column: Some("id"),
        essential: false,
        singleton: false,
    },
    CatalogEntry {
        name: "attendance_exceptions",
        rank: 6,
        identity_column: Some("id"),
        essential: false,
        singleton: false,
    },
    CatalogEntry {
        name: "leave_requests",
        rank: 7,
        identity_column: Some("id"),
        essential: false,
        singleton: false,
    },
    CatalogEntry {
        name: "audit_logs",
        rank: 8,
        identity_column: Some("id"),
        essential: false,
        singleton: false,
    },
    CatalogEntry {
        name: "backup_settings",
        rank: 9,
        identity_column: Some("id"),
        essential: false,
        singleton: true,
    },
    CatalogEntry {
        name: "sync_settings",
        rank: 10,
        identity_column: Some("id"),
        essential: false,
        singleton: true,
    },
];

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Immutable ordered table catalog.
///
/// # Invariants
/// - Entries are sorted by ascending rank.
/// - Table names are unique (case-insensitively).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCatalog {
    /// Dependency-ordered entries, parents first.
    entries: &'static [CatalogEntry],
}

impl TableCatalog {
    /// Returns the attendance-schema catalog.
    #[must_use]
    pub const fn attendance() -> Self {
        Self {
            entries: ATTENDANCE_TABLES,
        }
    }

    /// Returns entries in capture/load order (parents first).
    #[must_use]
    pub const fn tables(&self) -> &'static [CatalogEntry] {
        self.entries
    }

    /// Returns entries in clear order (children first).
    pub fn tables_reversed(&self) -> impl Iterator<Item = &'static CatalogEntry> {
        self.entries.iter().rev()
    }

    /// Returns whether `name` is a whitelisted catalog table.
    ///
    /// Membership is case-insensitive; any name failing this test must never
    /// be interpolated into generated SQL.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Looks up a catalog entry by table name (case-insensitive).
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&'static CatalogEntry> {
        self.entries.iter().find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Returns the dependency rank for `name` when the table is cataloged.
    #[must_use]
    pub fn rank(&self, name: &str) -> Option<usize> {
        self.entry(name).map(|entry| entry.rank)
    }

    /// Returns the tables whose post-restore emptiness is flagged as a warning.
    pub fn essential_tables(&self) -> impl Iterator<Item = &'static CatalogEntry> {
        self.entries.iter().filter(|entry| entry.essential)
    }

    /// Returns the singleton configuration tables seeded after restore.
    pub fn singleton_tables(&self) -> impl Iterator<Item = &'static CatalogEntry> {
        self.entries.iter().filter(|entry| entry.singleton)
    }

    /// Returns the number of cataloged tables.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the catalog has no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
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

    use super::FOREIGN_KEY_EDGES;
    use super::TableCatalog;

    #[test]
    fn catalog_ranks_are_sequential() {
        let catalog = TableCatalog::attendance();
        for (index, entry) in catalog.tables().iter().enumerate() {
            assert_eq!(entry.rank, index, "rank mismatch for {}", entry.name);
        }
    }

    #[test]
    fn catalog_membership_is_case_insensitive() {
        let catalog = TableCatalog::attendance();
        assert!(catalog.contains("users"));
        assert!(catalog.contains("USERS"));
        assert!(catalog.contains("Attendance_Logs"));
        assert!(!catalog.contains("users; DROP TABLE users"));
        assert!(!catalog.contains("sqlite_master"));
    }

    #[test]
    fn every_foreign_key_edge_names_cataloged_tables() {
        let catalog = TableCatalog::attendance();
        for (child, parent) in FOREIGN_KEY_EDGES {
            assert!(catalog.contains(child), "unknown child table {child}");
            assert!(catalog.contains(parent), "unknown parent table {parent}");
        }
    }
}
