// SpanMark - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every error names the record,
// document, or file it relates to so the UI can surface an actionable
// message at the point of the offending action.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all SpanMark operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum SpanMarkError {
    /// Document store operation failed.
    Store(StoreError),

    /// Annotation ledger operation failed.
    Ledger(LedgerError),

    /// Document ingestion failed.
    Ingest(IngestError),

    /// Text extraction from a binary format failed.
    Extraction(ExtractionError),

    /// Export operation failed.
    Export(ExportError),

    /// Import operation failed.
    Import(ImportError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for SpanMarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "Document store error: {e}"),
            Self::Ledger(e) => write!(f, "Annotation error: {e}"),
            Self::Ingest(e) => write!(f, "Ingest error: {e}"),
            Self::Extraction(e) => write!(f, "Extraction error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Import(e) => write!(f, "Import error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for SpanMarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Ledger(e) => Some(e),
            Self::Ingest(e) => Some(e),
            Self::Extraction(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Import(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Document store errors
// ---------------------------------------------------------------------------

/// Errors raised by the document store.
#[derive(Debug)]
pub enum StoreError {
    /// No document with the given id exists.
    NotFound { id: String },

    /// The supplied document text was blank.
    EmptyInput,

    /// A document with this id is already loaded.
    DuplicateId { id: String },

    /// The per-session document cap was reached.
    TooManyDocuments { max: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "no document with id '{id}'"),
            Self::EmptyInput => write!(f, "document text is empty"),
            Self::DuplicateId { id } => {
                write!(f, "a document with id '{id}' is already loaded")
            }
            Self::TooManyDocuments { max } => {
                write!(f, "session document limit of {max} reached")
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for SpanMarkError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Annotation ledger errors
// ---------------------------------------------------------------------------

/// Errors raised when creating, removing, or validating annotations.
#[derive(Debug)]
pub enum LedgerError {
    /// The referenced document does not exist in the store.
    DocumentNotFound { doc_id: String },

    /// No annotation with the given id exists (already removed, or never
    /// created).
    AnnotationNotFound { id: u64 },

    /// Span offsets are out of bounds or inverted.
    /// `doc_chars` is the character length of the referenced document.
    InvalidSpan {
        doc_id: String,
        start: usize,
        end: usize,
        doc_chars: usize,
    },

    /// An annotation must carry at least one label.
    EmptyLabels,

    /// An annotation with identical document, span, and label set already
    /// exists. Duplicates are rejected rather than silently merged.
    Duplicate {
        doc_id: String,
        start: usize,
        end: usize,
    },

    /// The label name contains the CSV join delimiter and would corrupt a
    /// CSV round-trip.
    ReservedDelimiter { label: String, delimiter: char },

    /// The label name is blank or exceeds the length limit.
    InvalidLabelName { label: String, max_chars: usize },

    /// No relation with the given id exists.
    RelationNotFound { id: u64 },

    /// A relation must link two distinct annotations.
    SelfRelation { annotation: u64 },

    /// A relation must link annotations within one document.
    CrossDocumentRelation { head: u64, tail: u64 },

    /// A relation with the same head, tail, and label already exists.
    DuplicateRelation { head: u64, tail: u64 },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DocumentNotFound { doc_id } => {
                write!(f, "document '{doc_id}' is not loaded")
            }
            Self::AnnotationNotFound { id } => {
                write!(f, "no annotation with id {id}")
            }
            Self::InvalidSpan {
                doc_id,
                start,
                end,
                doc_chars,
            } => write!(
                f,
                "span [{start}, {end}) is invalid for document '{doc_id}' \
                 ({doc_chars} characters); require 0 <= start < end <= length"
            ),
            Self::EmptyLabels => write!(f, "at least one label is required"),
            Self::Duplicate { doc_id, start, end } => write!(
                f,
                "an identical annotation already exists at [{start}, {end}) \
                 in document '{doc_id}'"
            ),
            Self::ReservedDelimiter { label, delimiter } => write!(
                f,
                "label '{label}' contains the reserved delimiter '{delimiter}'"
            ),
            Self::InvalidLabelName { label, max_chars } => write!(
                f,
                "label '{label}' must be non-blank and at most {max_chars} characters"
            ),
            Self::RelationNotFound { id } => write!(f, "no relation with id {id}"),
            Self::SelfRelation { annotation } => write!(
                f,
                "a relation must link two distinct annotations (got {annotation} twice)"
            ),
            Self::CrossDocumentRelation { head, tail } => write!(
                f,
                "annotations {head} and {tail} are in different documents"
            ),
            Self::DuplicateRelation { head, tail } => write!(
                f,
                "an identical relation between annotations {head} and {tail} already exists"
            ),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<LedgerError> for SpanMarkError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}

// ---------------------------------------------------------------------------
// Ingest errors
// ---------------------------------------------------------------------------

/// Errors raised while turning uploaded or on-disk sources into documents.
#[derive(Debug)]
pub enum IngestError {
    /// The file extension maps to no supported source format.
    UnsupportedFormat { path: PathBuf },

    /// The source produced no usable text.
    EmptyInput { path: Option<PathBuf> },

    /// The file exceeds the single-file size cap.
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    /// The ingest root does not exist.
    RootNotFound { path: PathBuf },

    /// The ingest root is not a directory.
    NotADirectory { path: PathBuf },

    /// A required CSV column is missing.
    MissingColumn { path: PathBuf, column: String },

    /// CSV parsing failed.
    Csv { path: PathBuf, source: csv::Error },

    /// ZIP archive could not be opened or read.
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    /// Text extraction from a binary source failed.
    Extraction(ExtractionError),

    /// Adding the extracted document to the store failed.
    Store(StoreError),

    /// I/O error reading a source file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat { path } => write!(
                f,
                "'{}' is not a supported format (.txt, .csv, .pdf, .zip)",
                path.display()
            ),
            Self::EmptyInput { path } => match path {
                Some(p) => write!(f, "'{}' contains no usable text", p.display()),
                None => write!(f, "pasted input contains no usable text"),
            },
            Self::FileTooLarge { path, size, max } => write!(
                f,
                "'{}' is {size} bytes, exceeds the {max}-byte limit",
                path.display()
            ),
            Self::RootNotFound { path } => {
                write!(f, "folder '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "'{}' is not a directory", path.display())
            }
            Self::MissingColumn { path, column } => write!(
                f,
                "CSV '{}' is missing required column '{column}'",
                path.display()
            ),
            Self::Csv { path, source } => {
                write!(f, "CSV error in '{}': {source}", path.display())
            }
            Self::Zip { path, source } => {
                write!(f, "ZIP error in '{}': {source}", path.display())
            }
            Self::Extraction(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv { source, .. } => Some(source),
            Self::Zip { source, .. } => Some(source),
            Self::Extraction(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<ExtractionError> for IngestError {
    fn from(e: ExtractionError) -> Self {
        Self::Extraction(e)
    }
}

impl From<IngestError> for SpanMarkError {
    fn from(e: IngestError) -> Self {
        Self::Ingest(e)
    }
}

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

/// Errors raised by the external text-extraction collaborator (PDF).
#[derive(Debug)]
pub enum ExtractionError {
    /// The extraction binary is not installed or not on PATH.
    MissingBinary {
        binary: &'static str,
        source: which::Error,
    },

    /// The extractor ran but reported failure.
    Failed { path: PathBuf, detail: String },

    /// The extractor produced non-UTF-8 output.
    NonUtf8Output { path: PathBuf },

    /// The extractor succeeded but produced no text (e.g. a scanned PDF
    /// with no text layer).
    Empty { path: PathBuf },

    /// I/O error launching the extractor.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBinary { binary, source } => write!(
                f,
                "'{binary}' not found ({source}); install poppler-utils to \
                 enable PDF ingestion"
            ),
            Self::Failed { path, detail } => {
                write!(f, "extraction failed for '{}': {detail}", path.display())
            }
            Self::NonUtf8Output { path } => write!(
                f,
                "extractor produced non-UTF-8 output for '{}'",
                path.display()
            ),
            Self::Empty { path } => write!(
                f,
                "no extractable text in '{}' (scanned image without a text layer?)",
                path.display()
            ),
            Self::Io { path, source } => write!(
                f,
                "cannot run extractor on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ExtractionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingBinary { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExtractionError> for SpanMarkError {
    fn from(e: ExtractionError) -> Self {
        Self::Extraction(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors raised while serialising the ledger.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for SpanMarkError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Import errors
// ---------------------------------------------------------------------------

/// Errors raised while deserialising previously exported annotations.
///
/// Both variants carry the zero-based index of the offending record so the
/// user can locate it in the source file.
#[derive(Debug)]
pub enum ImportError {
    /// The record is structurally malformed (missing field, wrong type,
    /// unparseable row).
    Parse { index: usize, reason: String },

    /// The record parsed but violates an annotation invariant (unknown
    /// document, bad span, empty labels, duplicate, span-text mismatch).
    Validation { index: usize, reason: String },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { index, reason } => {
                write!(f, "record {index}: {reason}")
            }
            Self::Validation { index, reason } => {
                write!(f, "record {index} failed validation: {reason}")
            }
        }
    }
}

impl std::error::Error for ImportError {}

impl From<ImportError> for SpanMarkError {
    fn from(e: ImportError) -> Self {
        Self::Import(e)
    }
}

/// Convenience type alias for SpanMark results.
pub type Result<T> = std::result::Result<T, SpanMarkError>;
