// crates/timevault-core/tests/catalog_order_unit.rs
// ============================================================================
// Module: Catalog Ordering Unit Tests
// Description: Dependency-order guarantees for the attendance table catalog.
// Purpose: Replay every declared foreign-key edge against catalog ranks.
// ============================================================================

//! ## Overview
//! The restore orchestrator relies on the catalog order being safe for every
//! foreign key in the schema. These tests replay each declared edge
//! explicitly rather than spot-checking, and pin the clear order to be the
//! exact reverse of the load order.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use timevault_core::FOREIGN_KEY_EDGES;
use timevault_core::TableCatalog;

#[test]
fn every_foreign_key_parent_ranks_before_its_child() {
    let catalog = TableCatalog::attendance();
    for (child, parent) in FOREIGN_KEY_EDGES {
        let child_rank = catalog.rank(child).unwrap_or_else(|| panic!("missing table {child}"));
        let parent_rank = catalog.rank(parent).unwrap_or_else(|| panic!("missing table {parent}"));
        assert!(
            parent_rank < child_rank,
            "edge {child} -> {parent}: parent rank {parent_rank} must be below child rank \
             {child_rank}"
        );
    }
}

#[test]
fn clear_order_is_exact_reverse_of_load_order() {
    let catalog = TableCatalog::attendance();
    let forward: Vec<&str> = catalog.tables().iter().map(|entry| entry.name).collect();
    let mut reversed: Vec<&str> = catalog.tables_reversed().map(|entry| entry.name).collect();
    reversed.reverse();
    assert_eq!(forward, reversed);
}

#[test]
fn table_names_are_unique_case_insensitively() {
    let catalog = TableCatalog::attendance();
    let mut names: Vec<String> =
        catalog.tables().iter().map(|entry| entry.name.to_ascii_lowercase()).collect();
    names.sort();
    let before = names.len();
    names.dedup();
    assert_eq!(before, names.len(), "duplicate table name in catalog");
}

#[test]
fn essential_and_singleton_sets_match_domain_expectations() {
    let catalog = TableCatalog::attendance();
    let essential: Vec<&str> = catalog.essential_tables().map(|entry| entry.name).collect();
    assert_eq!(essential, vec!["departments", "users"]);
    let singletons: Vec<&str> = catalog.singleton_tables().map(|entry| entry.name).collect();
    assert_eq!(singletons, vec!["backup_settings", "sync_settings"]);
}

#[test]
fn identity_columns_cover_every_row_table() {
    let catalog = TableCatalog::attendance();
    for entry in catalog.tables() {
        assert!(
            entry.identity_column.is_some(),
            "table {} is expected to carry an identity column",
            entry.name
        );
    }
}
