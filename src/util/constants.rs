// SpanMark - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "SpanMark";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "SpanMark";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Labels
// =============================================================================

/// Labels seeded into a fresh session. The user can extend this set at
/// runtime; these are the categories clinical annotators reach for first.
pub const DEFAULT_LABELS: &[&str] = &[
    "Diagnosis",
    "Symptom",
    "Medication",
    "Procedure",
    "Test",
    "Other",
];

/// Delimiter used to join multi-label sets in the CSV `labels` column.
///
/// Label names containing the active delimiter are rejected at creation time
/// so a CSV round-trip can never split one label into two.
pub const DEFAULT_LABEL_DELIMITER: char = ';';

/// Maximum length of a single label name in characters.
pub const MAX_LABEL_LENGTH: usize = 64;

/// Label pre-filled for a new relation when the user leaves the field blank.
pub const DEFAULT_RELATION_LABEL: &str = "relates_to";

// =============================================================================
// Document ingestion limits
// =============================================================================

/// Maximum directory recursion depth during folder ingestion.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Maximum number of files ingested from a single folder operation.
pub const DEFAULT_MAX_FILES: usize = 500;

/// Hard upper bound on max files (prevents configuration mistakes).
pub const ABSOLUTE_MAX_FILES: usize = 10_000;

/// Hard upper bound on max depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 50;

/// Minimum sensible value for the max-files limit.
pub const MIN_MAX_FILES: usize = 1;

/// Maximum size in bytes of a single ingested file. Larger files are
/// skipped with a warning rather than loaded into session memory.
pub const MAX_SOURCE_FILE_SIZE: u64 = 32 * 1024 * 1024; // 32 MB

/// Maximum number of documents held in one session. At typical clinical
/// note sizes this caps heap usage well below anything a single annotator
/// could work through anyway.
pub const MAX_DOCUMENTS: usize = 50_000;

/// Default include glob patterns for folder ingestion.
pub const DEFAULT_INCLUDE_PATTERNS: &[&str] = &["*.txt", "*.csv", "*.pdf", "*.zip"];

/// Default exclude glob patterns for folder ingestion.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &["node_modules", ".git", "__pycache__"];

/// Default CSV column holding the document identifier.
pub const DEFAULT_CSV_ID_COLUMN: &str = "id";

/// Default CSV column holding the document body text.
pub const DEFAULT_CSV_TEXT_COLUMN: &str = "text";

/// Width of the zero-padded sequence number in auto-assigned document ids
/// (`doc_0001`, `doc_0002`, ...).
pub const DOC_ID_PAD_WIDTH: usize = 4;

// =============================================================================
// Session limits
// =============================================================================

/// Maximum number of non-fatal warnings accumulated in one session.
/// Prevents the warnings Vec from growing without bound when a folder
/// ingest hits many unreadable or oversized files.
pub const MAX_WARNINGS: usize = 1_000;

/// Maximum number of search matches collected for one query.
pub const MAX_SEARCH_MATCHES: usize = 5_000;

// =============================================================================
// UI defaults
// =============================================================================

/// Default UI body font size in points.
pub const DEFAULT_FONT_SIZE: f32 = 14.5;

/// Minimum user-configurable UI font size (points).
pub const MIN_FONT_SIZE: f32 = 10.0;

/// Maximum user-configurable UI font size (points).
pub const MAX_FONT_SIZE: f32 = 24.0;

/// Number of characters of span text shown in list rows before truncation.
pub const SPAN_PREVIEW_CHARS: usize = 40;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration and workspace files
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Workspace persistence file name suggested by the save dialog.
pub const WORKSPACE_FILE_NAME: &str = "workspace.json";

/// Workspace schema version accepted by the loader.
pub const WORKSPACE_VERSION: u32 = 1;
