// SpanMark - core/ingest.rs
//
// Turning raw sources (pasted text, .txt, .csv, .pdf, .zip files) into
// documents.
//
// The source format is resolved exactly once, from the file extension, into
// the `SourceFormat` variant — nothing downstream re-sniffs content. PDF
// text extraction is a black-box collaborator behind the `TextExtractor`
// trait; the poppler-backed implementation lives in the platform layer so
// the core stays free of process spawning.

use crate::core::model::SourceFormat;
use crate::core::store::DocumentStore;
use crate::util::constants;
use crate::util::error::{ExtractionError, IngestError};
use std::io::{Read, Write};
use std::path::Path;

// =============================================================================
// Extraction seam
// =============================================================================

/// External text-extraction collaborator for binary formats.
pub trait TextExtractor {
    /// Extract the full text of the file at `path`.
    fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Any closure with the right shape is an extractor; used by tests and by
/// callers that want to stub PDF support out.
impl<F> TextExtractor for F
where
    F: Fn(&Path) -> Result<String, ExtractionError>,
{
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        self(path)
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Tunable ingestion policy. All defaults reference named constants.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// CSV column holding the document identifier.
    pub csv_id_column: String,

    /// CSV column holding the document body text.
    pub csv_text_column: String,

    /// Per-file size cap in bytes.
    pub max_file_size: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            csv_id_column: constants::DEFAULT_CSV_ID_COLUMN.to_string(),
            csv_text_column: constants::DEFAULT_CSV_TEXT_COLUMN.to_string(),
            max_file_size: constants::MAX_SOURCE_FILE_SIZE,
        }
    }
}

// =============================================================================
// Plain-text ingestion
// =============================================================================

/// Split raw pasted or file text into one-or-more document bodies.
///
/// Line endings are normalised to `\n` first so offsets are stable across
/// platforms. A blank line separates documents; input without a blank line
/// is a single document.
pub fn split_documents(raw: &str) -> Vec<String> {
    let raw = raw.replace("\r\n", "\n");
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }
    if raw.contains("\n\n") {
        raw.split("\n\n")
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        vec![raw.to_string()]
    }
}

/// Ingest pasted or plain-text file content, one document per blank-line
/// separated block. Returns the number of documents added.
///
/// Blocks are added in order and the operation is not atomic: if a later
/// block is rejected (for example when the session document cap is hit),
/// the blocks added before it stay in the store and the error describes
/// the rejected block.
///
/// `origin` is the source file for error context; `None` means pasted text.
pub fn ingest_text(
    store: &mut DocumentStore,
    content: &str,
    origin: Option<&Path>,
) -> Result<usize, IngestError> {
    let bodies = split_documents(content);
    if bodies.is_empty() {
        return Err(IngestError::EmptyInput {
            path: origin.map(Path::to_path_buf),
        });
    }
    let mut added = 0;
    for body in bodies {
        store.add_document(body)?;
        added += 1;
    }
    Ok(added)
}

// =============================================================================
// CSV ingestion
// =============================================================================

/// Ingest a CSV where each row is one document, using the configured
/// id/text columns. Rows with a blank text cell are skipped. Returns the
/// number of documents added.
pub fn ingest_csv(
    store: &mut DocumentStore,
    content: &str,
    origin: &Path,
    config: &IngestConfig,
) -> Result<usize, IngestError> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| IngestError::Csv {
            path: origin.to_path_buf(),
            source: e,
        })?
        .clone();

    let id_pos = headers
        .iter()
        .position(|h| h == config.csv_id_column)
        .ok_or_else(|| IngestError::MissingColumn {
            path: origin.to_path_buf(),
            column: config.csv_id_column.clone(),
        })?;
    let text_pos = headers
        .iter()
        .position(|h| h == config.csv_text_column)
        .ok_or_else(|| IngestError::MissingColumn {
            path: origin.to_path_buf(),
            column: config.csv_text_column.clone(),
        })?;

    let mut added = 0;
    for row in reader.records() {
        let row = row.map_err(|e| IngestError::Csv {
            path: origin.to_path_buf(),
            source: e,
        })?;
        let id = row.get(id_pos).unwrap_or("").trim();
        let text = row.get(text_pos).unwrap_or("");
        if id.is_empty() || text.trim().is_empty() {
            tracing::debug!(file = %origin.display(), "Skipping CSV row with blank id or text");
            continue;
        }
        store.add_document_with_id(id, text)?;
        added += 1;
    }

    if added == 0 {
        return Err(IngestError::EmptyInput {
            path: Some(origin.to_path_buf()),
        });
    }
    Ok(added)
}

// =============================================================================
// ZIP archive ingestion
// =============================================================================

/// Ingest every supported entry of a `.zip` archive.
///
/// Each entry is handled like a standalone file of its extension. Entries
/// that are oversized, unsupported, unreadable, or fail to parse are logged
/// and skipped; the archive as a whole fails only when it cannot be opened
/// or yields no documents at all. Nested archives are skipped, not descended
/// into. PDF entries are spooled to a temporary file for the extractor.
pub fn ingest_zip(
    store: &mut DocumentStore,
    path: &Path,
    config: &IngestConfig,
    extractor: &dyn TextExtractor,
) -> Result<usize, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| IngestError::Zip {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut added = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| IngestError::Zip {
            path: path.to_path_buf(),
            source: e,
        })?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let format = SourceFormat::detect(Path::new(&name));
        if matches!(format, SourceFormat::Zip | SourceFormat::Unsupported) {
            tracing::debug!(entry = %name, "Skipping unsupported archive entry");
            continue;
        }
        if entry.size() > config.max_file_size {
            tracing::warn!(
                entry = %name,
                size = entry.size(),
                max = config.max_file_size,
                "Skipping oversized archive entry"
            );
            continue;
        }

        let mut bytes = Vec::new();
        if let Err(e) = entry.read_to_end(&mut bytes) {
            tracing::warn!(entry = %name, error = %e, "Skipping unreadable archive entry");
            continue;
        }

        // Entry paths keep the archive as a prefix so warnings and errors
        // name both the archive and the entry.
        let origin = path.join(&name);
        let result = match format {
            SourceFormat::Csv => {
                ingest_csv(store, &String::from_utf8_lossy(&bytes), &origin, config)
            }
            SourceFormat::Pdf => ingest_pdf_bytes(store, &bytes, &origin, extractor),
            // Text is the only variant left after the guards above.
            _ => ingest_text(store, &String::from_utf8_lossy(&bytes), Some(&origin)),
        };
        match result {
            Ok(n) => added += n,
            Err(e) => {
                tracing::warn!(entry = %name, error = %e, "Skipping failed archive entry");
            }
        }
    }

    if added == 0 {
        return Err(IngestError::EmptyInput {
            path: Some(path.to_path_buf()),
        });
    }
    Ok(added)
}

/// Spool PDF bytes from an archive entry to a temporary file and run them
/// through the extractor, which only operates on paths.
fn ingest_pdf_bytes(
    store: &mut DocumentStore,
    bytes: &[u8],
    origin: &Path,
    extractor: &dyn TextExtractor,
) -> Result<usize, IngestError> {
    let mut spool = tempfile::NamedTempFile::new().map_err(|e| IngestError::Io {
        path: origin.to_path_buf(),
        source: e,
    })?;
    spool.write_all(bytes).map_err(|e| IngestError::Io {
        path: origin.to_path_buf(),
        source: e,
    })?;
    let text = extractor.extract(spool.path())?;
    if text.trim().is_empty() {
        return Err(IngestError::EmptyInput {
            path: Some(origin.to_path_buf()),
        });
    }
    store.add_document(text)?;
    Ok(1)
}

// =============================================================================
// Single-file dispatch
// =============================================================================

/// Ingest one file, dispatching on its detected format. Returns the number
/// of documents added.
pub fn ingest_path(
    store: &mut DocumentStore,
    path: &Path,
    config: &IngestConfig,
    extractor: &dyn TextExtractor,
) -> Result<usize, IngestError> {
    let metadata = std::fs::metadata(path).map_err(|e| IngestError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if metadata.len() > config.max_file_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max: config.max_file_size,
        });
    }

    let format = SourceFormat::detect(path);
    tracing::debug!(file = %path.display(), format = format.label(), "Ingesting file");

    match format {
        SourceFormat::Text => {
            let content = std::fs::read_to_string(path).map_err(|e| IngestError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            ingest_text(store, &content, Some(path))
        }
        SourceFormat::Csv => {
            let content = std::fs::read_to_string(path).map_err(|e| IngestError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
            ingest_csv(store, &content, path, config)
        }
        SourceFormat::Pdf => {
            // A PDF becomes exactly one document; page breaks arrive from
            // the extractor as blank lines but are not split on.
            let text = extractor.extract(path)?;
            if text.trim().is_empty() {
                return Err(IngestError::EmptyInput {
                    path: Some(path.to_path_buf()),
                });
            }
            store.add_document(text)?;
            Ok(1)
        }
        SourceFormat::Zip => ingest_zip(store, path, config, extractor),
        SourceFormat::Unsupported => Err(IngestError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn no_pdf(_: &Path) -> Result<String, ExtractionError> {
        panic!("extractor must not be called for non-PDF sources");
    }

    #[test]
    fn test_split_documents_on_blank_lines() {
        let raw = "First note.\nSecond line.\n\nSecond note.\r\n\r\nThird note.";
        let docs = split_documents(raw);
        assert_eq!(
            docs,
            vec![
                "First note.\nSecond line.",
                "Second note.",
                "Third note."
            ]
        );
    }

    #[test]
    fn test_split_documents_single_block() {
        assert_eq!(split_documents("one note\nonly"), vec!["one note\nonly"]);
        assert!(split_documents("   \n \n  ").is_empty());
    }

    #[test]
    fn test_ingest_text_empty_is_rejected() {
        let mut store = DocumentStore::new();
        let err = ingest_text(&mut store, "  \n ", None).unwrap_err();
        assert!(matches!(err, IngestError::EmptyInput { path: None }));
    }

    #[test]
    fn test_ingest_csv_uses_configured_columns() {
        let mut store = DocumentStore::new();
        let config = IngestConfig {
            csv_id_column: "note_id".to_string(),
            csv_text_column: "body".to_string(),
            ..Default::default()
        };
        let content = "note_id,body,extra\nn1,Patient stable.,x\nn2,Follow-up due.,y\n";
        let added =
            ingest_csv(&mut store, content, &PathBuf::from("notes.csv"), &config).unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.get("n1").unwrap().text, "Patient stable.");
    }

    #[test]
    fn test_ingest_csv_missing_column() {
        let mut store = DocumentStore::new();
        let content = "id,body\nn1,hello\n";
        let err = ingest_csv(
            &mut store,
            content,
            &PathBuf::from("notes.csv"),
            &IngestConfig::default(),
        )
        .unwrap_err();
        match err {
            IngestError::MissingColumn { column, .. } => assert_eq!(column, "text"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_ingest_csv_skips_blank_rows() {
        let mut store = DocumentStore::new();
        let content = "id,text\nn1,Real note.\nn2,\n,orphan text\n";
        let added = ingest_csv(
            &mut store,
            content,
            &PathBuf::from("notes.csv"),
            &IngestConfig::default(),
        )
        .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ingest_path_txt_splits_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "Note one.\n\nNote two.").unwrap();

        let mut store = DocumentStore::new();
        let added =
            ingest_path(&mut store, &path, &IngestConfig::default(), &no_pdf).unwrap();
        assert_eq!(added, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ingest_path_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let mut store = DocumentStore::new();
        let err =
            ingest_path(&mut store, &path, &IngestConfig::default(), &no_pdf).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_ingest_path_pdf_goes_through_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, b"%PDF-1.4 stub").unwrap();

        let extractor =
            |_: &Path| -> Result<String, ExtractionError> { Ok("Extracted text.".to_string()) };
        let mut store = DocumentStore::new();
        let added =
            ingest_path(&mut store, &path, &IngestConfig::default(), &extractor).unwrap();
        assert_eq!(added, 1);
        let doc = store.documents().next().unwrap();
        assert_eq!(doc.text, "Extracted text.");
    }

    #[test]
    fn test_ingest_text_keeps_earlier_blocks_when_cap_hit() {
        use crate::util::error::StoreError;

        let mut store = DocumentStore::new();
        for _ in 0..constants::MAX_DOCUMENTS - 1 {
            store.add_document("filler").unwrap();
        }
        let err = ingest_text(&mut store, "First block.\n\nSecond block.", None).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Store(StoreError::TooManyDocuments { .. })
        ));
        // The first block landed before the cap rejected the second.
        assert_eq!(store.len(), constants::MAX_DOCUMENTS);
    }

    fn write_test_archive(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("a.txt", options).unwrap();
        writer.write_all(b"Note one.\n\nNote two.").unwrap();
        writer.start_file("b.csv", options).unwrap();
        writer.write_all(b"id,text\nz1,Zipped note.\n").unwrap();
        writer.start_file("image.png", options).unwrap();
        writer.write_all(b"\x89PNG").unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_ingest_path_zip_loads_supported_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.zip");
        write_test_archive(&path);

        let mut store = DocumentStore::new();
        let added =
            ingest_path(&mut store, &path, &IngestConfig::default(), &no_pdf).unwrap();
        // Two txt blocks plus one CSV row; the PNG entry is skipped.
        assert_eq!(added, 3);
        assert_eq!(store.len(), 3);
        assert_eq!(store.get("z1").unwrap().text, "Zipped note.");
    }

    #[test]
    fn test_ingest_zip_with_no_usable_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("image.png", options).unwrap();
        writer.write_all(b"\x89PNG").unwrap();
        writer.finish().unwrap();

        let mut store = DocumentStore::new();
        let err =
            ingest_path(&mut store, &path, &IngestConfig::default(), &no_pdf).unwrap_err();
        assert!(matches!(err, IngestError::EmptyInput { path: Some(_) }));
    }

    #[test]
    fn test_ingest_path_enforces_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, "0123456789").unwrap();

        let config = IngestConfig {
            max_file_size: 5,
            ..Default::default()
        };
        let mut store = DocumentStore::new();
        let err = ingest_path(&mut store, &path, &config, &no_pdf).unwrap_err();
        assert!(matches!(err, IngestError::FileTooLarge { .. }));
    }
}
