// crates/timevault-core/src/lib.rs
// ============================================================================
// Module: Timevault Core
// Description: Database-free primitives for the backup/restore engine.
// Purpose: Catalog, value encoding, dump format, parsing, and verification.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! `timevault-core` holds everything the backup/restore engine can do without
//! a database connection: the dependency-ordered [`catalog::TableCatalog`],
//! the [`value`] literal encoder, the [`dump`] text format with its rendering
//! helpers, the tolerant [`parser`], the read-only [`verify`] audit, and the
//! [`audit::AuditSink`] collaborator contract. The rusqlite-backed writer,
//! restore orchestrator, and retention sweeper live in `timevault-engine`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod catalog;
pub mod dump;
pub mod parser;
pub mod value;
pub mod verify;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use audit::AuditAction;
pub use audit::AuditEvent;
pub use audit::AuditSink;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use catalog::CatalogEntry;
pub use catalog::FOREIGN_KEY_EDGES;
pub use catalog::TableCatalog;
pub use dump::DumpError;
pub use dump::DumpHeader;
pub use dump::SCHEMA_VERSION;
pub use parser::DumpDocument;
pub use parser::parse;
pub use value::SqlValue;
pub use value::encode;
pub use verify::TableCount;
pub use verify::VerificationResult;
pub use verify::verify;
