// crates/timevault-core/src/parser.rs
// ============================================================================
// Module: Dump Parser
// Description: Tolerant extraction of header fields and insert statements.
// Purpose: Turn dump text into per-table statement groups for replay.
// Dependencies: crate::dump
// ============================================================================

//! ## Overview
//! Parsing is intentionally tolerant: header fields are matched per labeled
//! line independent of ordering, and row statements are recognized anywhere
//! in the document by their shape (`INSERT INTO`, table name, column list,
//! `VALUES`, value list, terminator), case-insensitively. Statements are kept
//! as opaque text because restore replays them verbatim. A table absent from
//! every statement is simply absent from the result; emptiness is judged by
//! the verifier, not here.
//!
//! The writer fully controls the statement shape it produces, so a small
//! dedicated tokenizer is sufficient; quoted values with doubled embedded
//! quotes are respected so literal content can never truncate a scan.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::dump::CREATED_AT_LABEL;
use crate::dump::DUMP_SENTINEL;
use crate::dump::DumpHeader;
use crate::dump::FOOTER_LABEL;
use crate::dump::MACHINE_NAME_LABEL;
use crate::dump::RECORDS_LABEL;
use crate::dump::SCHEMA_VERSION_LABEL;
use crate::dump::TABLE_LABEL;

// ============================================================================
// SECTION: Document
// ============================================================================

/// Parsed dump content grouped for replay and verification.
///
/// # Invariants
/// - Table keys are lowercase.
/// - Statement texts are verbatim slices of the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpDocument {
    /// Header metadata; absent fields are `None`.
    pub header: DumpHeader,
    /// Whether the dump sentinel line was found.
    pub sentinel_present: bool,
    /// Row-insert statements bucketed by lowercase table name.
    pub tables: BTreeMap<String, Vec<String>>,
    /// Per-table declared record counts from section trailers.
    pub declared_counts: BTreeMap<String, u64>,
    /// Declared total record count from the footer, when present.
    pub declared_total: Option<u64>,
}

impl DumpDocument {
    /// Returns the total number of parsed statements across all tables.
    #[must_use]
    pub fn statement_count(&self) -> u64 {
        self.tables.values().map(|group| u64::try_from(group.len()).unwrap_or(u64::MAX)).sum()
    }

    /// Returns the parsed statements for a table (empty when absent).
    #[must_use]
    pub fn statements_for(&self, table: &str) -> &[String] {
        self.tables.get(&table.to_ascii_lowercase()).map_or(&[], Vec::as_slice)
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses dump text into header metadata and per-table statement groups.
///
/// Never fails: malformed regions are skipped and absent metadata stays
/// `None`. Callers decide what absence means.
#[must_use]
pub fn parse(text: &str) -> DumpDocument {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut document = DumpDocument::default();
    parse_comment_lines(text, &mut document);
    parse_statements(text, &mut document);
    document
}

/// Extracts sentinel, header fields, section counts, and the footer.
fn parse_comment_lines(text: &str, document: &mut DumpDocument) {
    let mut current_table: Option<String> = None;
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line == DUMP_SENTINEL {
            document.sentinel_present = true;
        } else if let Some(value) = labeled_value(line, SCHEMA_VERSION_LABEL) {
            document.header.schema_version = Some(value);
        } else if let Some(value) = labeled_value(line, CREATED_AT_LABEL) {
            document.header.created_at = Some(value);
        } else if let Some(value) = labeled_value(line, MACHINE_NAME_LABEL) {
            document.header.machine_name = Some(value);
        } else if let Some(value) = labeled_value(line, TABLE_LABEL) {
            current_table = Some(value.trim_matches('"').to_ascii_lowercase());
        } else if let Some(value) = labeled_value(line, RECORDS_LABEL) {
            if let (Some(table), Some(count)) = (current_table.as_ref(), leading_u64(&value)) {
                document.declared_counts.insert(table.clone(), count);
            }
        } else if let Some(value) = labeled_value(line, FOOTER_LABEL) {
            if let Some(total) = leading_u64(&value) {
                document.declared_total = Some(total);
            }
        }
    }
}

/// Returns the trimmed value of a labeled comment line, when it matches.
fn labeled_value(line: &str, label: &str) -> Option<String> {
    let prefix = line.get(.. label.len())?;
    if !prefix.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = line.get(label.len() ..)?;
    Some(rest.trim().trim_end_matches("--").trim().to_string())
}

/// Parses the leading unsigned integer of a labeled value, when present.
fn leading_u64(value: &str) -> Option<u64> {
    value.split_whitespace().next().and_then(|token| token.parse::<u64>().ok())
}

/// Scans the whole document for row-insert statements and buckets them.
fn parse_statements(text: &str, document: &mut DumpDocument) {
    let lower = text.to_ascii_lowercase();
    let mut cursor = 0usize;
    while let Some(found) = lower[cursor ..].find("insert") {
        let start = cursor + found;
        match parse_one_statement(text, start) {
            Some((table, end)) => {
                let statement = text[start .. end].to_string();
                document.tables.entry(table).or_default().push(statement);
                cursor = end;
            }
            None => cursor = start + "insert".len(),
        }
    }
}

/// Attempts to parse one full insert statement starting at `start`.
///
/// Returns the lowercase table name and the exclusive end offset (past the
/// terminator) on success.
fn parse_one_statement(text: &str, start: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let mut pos = start + "insert".len();
    pos = skip_whitespace(bytes, pos);
    pos = expect_keyword(text, pos, "into")?;
    pos = skip_whitespace(bytes, pos);
    let (table, next) = parse_table_name(text, pos)?;
    pos = skip_whitespace(bytes, next);
    pos = expect_byte(bytes, pos, b'(')?;
    pos = scan_past_byte(bytes, pos, b')')?;
    pos = skip_whitespace(bytes, pos);
    pos = expect_keyword(text, pos, "values")?;
    pos = skip_whitespace(bytes, pos);
    pos = expect_byte(bytes, pos, b'(')?;
    pos = scan_value_list(bytes, pos)?;
    pos = skip_whitespace(bytes, pos);
    pos = expect_byte(bytes, pos, b';')?;
    Some((table.to_ascii_lowercase(), pos))
}

/// Skips ASCII whitespace starting at `pos`.
const fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Consumes a case-insensitive keyword, returning the position after it.
fn expect_keyword(text: &str, pos: usize, keyword: &str) -> Option<usize> {
    let slice = text.get(pos .. pos + keyword.len())?;
    slice.eq_ignore_ascii_case(keyword).then_some(pos + keyword.len())
}

/// Consumes one expected byte, returning the position after it.
fn expect_byte(bytes: &[u8], pos: usize, expected: u8) -> Option<usize> {
    (pos < bytes.len() && bytes[pos] == expected).then_some(pos + 1)
}

/// Parses a quoted or bare table name, returning it with the next position.
fn parse_table_name(text: &str, pos: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(pos) == Some(&b'"') {
        let name_start = pos + 1;
        let mut end = name_start;
        while end < bytes.len() && bytes[end] != b'"' {
            end += 1;
        }
        if end >= bytes.len() || end == name_start {
            return None;
        }
        return Some((text.get(name_start .. end)?.to_string(), end + 1));
    }
    let mut end = pos;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    if end == pos {
        return None;
    }
    Some((text.get(pos .. end)?.to_string(), end))
}

/// Scans past the next unquoted occurrence of `target`.
fn scan_past_byte(bytes: &[u8], mut pos: usize, target: u8) -> Option<usize> {
    while pos < bytes.len() {
        if bytes[pos] == target {
            return Some(pos + 1);
        }
        pos += 1;
    }
    None
}

/// Scans a parenthesized value list, honoring quoted literals.
///
/// `pos` points just past the opening parenthesis. Doubled quotes inside a
/// literal are treated as escapes, so quote characters in values never
/// terminate the scan early.
fn scan_value_list(bytes: &[u8], mut pos: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut in_quote = false;
    while pos < bytes.len() {
        let byte = bytes[pos];
        if in_quote {
            if byte == b'\'' {
                if bytes.get(pos + 1) == Some(&b'\'') {
                    pos += 2;
                    continue;
                }
                in_quote = false;
            }
        } else {
            match byte {
                b'\'' => in_quote = true,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(pos + 1);
                    }
                }
                _ => {}
            }
        }
        pos += 1;
    }
    None
}
