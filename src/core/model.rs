// SpanMark - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;
use std::path::Path;

// =============================================================================
// Document
// =============================================================================

/// A single loaded text document.
///
/// The text is immutable once loaded: annotations store character offsets
/// into it, so any mutation would silently invalidate the whole ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique, stable identifier assigned at load time. Either a CSV-supplied
    /// id or an auto-assigned sequence id (`doc_0001`-style).
    pub id: String,

    /// Raw document text.
    pub text: String,
}

impl Document {
    /// Character length of the document text.
    ///
    /// All span offsets in SpanMark are Unicode scalar (char) offsets, not
    /// byte offsets, so exported offsets are meaningful to downstream tools
    /// that index text the way annotators read it.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

// =============================================================================
// Annotation
// =============================================================================

/// One labelled span within a document.
///
/// Invariants (enforced by the ledger at creation and import time):
///   - `doc_id` references a document present in the store
///   - `0 <= start < end <= document character length`
///   - `labels` is non-empty
///   - no other annotation shares the same `(doc_id, start, end, labels)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier within the ledger, assigned at creation.
    pub id: u64,

    /// Id of the annotated document.
    pub doc_id: String,

    /// Span start, inclusive, in characters.
    pub start: usize,

    /// Span end, exclusive, in characters.
    pub end: usize,

    /// Labels applied to this span. A set: applying the same label twice is
    /// meaningless, and the sorted order makes serialised output stable.
    pub labels: BTreeSet<String>,
}

impl Annotation {
    /// True if `other` covers the same document, span, and label set.
    /// Ids are deliberately ignored; this is the ledger's duplicate test.
    pub fn same_content(&self, other: &Annotation) -> bool {
        self.doc_id == other.doc_id
            && self.start == other.start
            && self.end == other.end
            && self.labels == other.labels
    }
}

// =============================================================================
// Relation
// =============================================================================

/// A directed link between two annotations in the same document
/// (e.g. a Medication span that `treats` a Diagnosis span).
///
/// Invariants (enforced by the ledger):
///   - `head` and `tail` reference existing annotations on `doc_id`
///   - `head != tail`
///   - `label` is non-blank
///   - no other relation shares the same `(head, tail, label)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Unique identifier within the ledger, assigned at creation.
    pub id: u64,

    /// Document both linked annotations belong to.
    pub doc_id: String,

    /// Id of the annotation the relation points from.
    pub head: u64,

    /// Id of the annotation the relation points to.
    pub tail: u64,

    /// Relation label (e.g. "relates_to", "treats").
    pub label: String,
}

// =============================================================================
// Char-offset helpers
// =============================================================================

/// Convert a character-offset span into a byte range within `text`.
///
/// Returns `None` if the span is inverted or extends past the end of the
/// text. `end == char count` is valid (exclusive bound).
pub fn byte_range(text: &str, start: usize, end: usize) -> Option<Range<usize>> {
    if start >= end {
        return None;
    }
    let mut byte_start = None;
    let mut byte_end = None;
    for (chars_seen, (byte_idx, _)) in text.char_indices().enumerate() {
        if chars_seen == start {
            byte_start = Some(byte_idx);
        }
        if chars_seen == end {
            byte_end = Some(byte_idx);
            break;
        }
    }
    // A span ending exactly at the last character has its exclusive bound
    // at the end of the string.
    if byte_end.is_none() && end == text.chars().count() {
        byte_end = Some(text.len());
    }
    match (byte_start, byte_end) {
        (Some(s), Some(e)) => Some(s..e),
        _ => None,
    }
}

/// The substring covered by a character-offset span, or `None` if the span
/// is out of bounds.
pub fn span_text(text: &str, start: usize, end: usize) -> Option<&str> {
    byte_range(text, start, end).map(|r| &text[r])
}

// =============================================================================
// Source format
// =============================================================================

/// Upload format, resolved exactly once from the file extension at
/// ingestion time. Nothing downstream re-sniffs the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Plain text: the whole file (split on blank lines) becomes documents.
    Text,

    /// CSV: one row per document, id/text columns configurable.
    Csv,

    /// PDF: routed through the external text extractor.
    Pdf,

    /// ZIP archive: each supported entry is ingested as if it were a
    /// standalone file. Nested archives are not descended into.
    Zip,

    /// Anything else. Carried as a variant (rather than an early error) so
    /// folder ingestion can count and report skipped files uniformly.
    Unsupported,
}

impl SourceFormat {
    /// Resolve the format from a path's extension (case-insensitive).
    pub fn detect(path: &Path) -> SourceFormat {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("txt") => SourceFormat::Text,
            Some("csv") => SourceFormat::Csv,
            Some("pdf") => SourceFormat::Pdf,
            Some("zip") => SourceFormat::Zip,
            _ => SourceFormat::Unsupported,
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            SourceFormat::Text => "Text",
            SourceFormat::Csv => "CSV",
            SourceFormat::Pdf => "PDF",
            SourceFormat::Zip => "ZIP",
            SourceFormat::Unsupported => "Unsupported",
        }
    }
}

// =============================================================================
// Ingest summary
// =============================================================================

/// Summary statistics for a completed ingest operation (single file,
/// multi-file, or folder).
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    /// Files examined (after include/exclude filtering).
    pub files_seen: usize,

    /// Files that produced at least one document.
    pub files_loaded: usize,

    /// Files skipped: unsupported format, oversized, unreadable, or empty.
    pub files_skipped: usize,

    /// Documents added to the store.
    pub documents_added: usize,
}

impl IngestSummary {
    /// Fold another summary into this one (used when ingesting batches).
    pub fn absorb(&mut self, other: &IngestSummary) {
        self.files_seen += other.files_seen;
        self.files_loaded += other.files_loaded;
        self.files_skipped += other.files_skipped;
        self.documents_added += other.documents_added;
    }
}

// =============================================================================
// Tests
// =============================================================================
