// SpanMark - tests/e2e_annotation.rs
//
// End-to-end tests for the annotation pipeline.
//
// These tests exercise the real filesystem: real walkdir traversal of the
// fixtures directory, real export files written to and read back from
// disk, and real workspace persistence — no mocks, no stubs (the PDF
// extractor is the only substituted collaborator, since poppler is not a
// build dependency).

use spanmark::app::ingest::{ingest_folder, FolderConfig};
use spanmark::app::workspace::{self, WorkspaceData};
use spanmark::core::export;
use spanmark::core::ingest::IngestConfig;
use spanmark::core::ledger::AnnotationLedger;
use spanmark::core::model::span_text;
use spanmark::core::store::DocumentStore;
use spanmark::util::error::{ExtractionError, ImportError};
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Helpers
// =============================================================================

/// Absolute path to the on-disk fixture files.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn no_pdf(_: &Path) -> Result<String, ExtractionError> {
    panic!("no PDF fixtures exist; the extractor must not be called");
}

/// Ingest the fixtures directory into a fresh store.
fn ingest_fixtures() -> DocumentStore {
    let mut store = DocumentStore::new();
    let (summary, warnings) = ingest_folder(
        &mut store,
        &fixtures_dir(),
        &FolderConfig::default(),
        &IngestConfig::default(),
        &no_pdf,
    )
    .expect("fixture ingest must succeed");
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    assert_eq!(summary.files_loaded, 2);
    store
}

// =============================================================================
// Folder ingest E2E
// =============================================================================

/// Ingesting the fixtures directory loads the CSV rows under their own ids
/// and splits the text file into one document per blank-line block.
#[test]
fn e2e_folder_ingest_loads_fixture_documents() {
    let store = ingest_fixtures();
    assert_eq!(store.len(), 4);

    // CSV rows keep their supplied ids.
    assert!(store
        .get("note-100")
        .unwrap()
        .text
        .contains("Lisinopril"));
    assert!(store.get("note-101").unwrap().text.contains("Follow-up"));

    // The .txt file split into two auto-id documents.
    let auto_docs: Vec<_> = store
        .documents()
        .filter(|d| d.id.starts_with("doc_"))
        .collect();
    assert_eq!(auto_docs.len(), 2);
    assert!(auto_docs.iter().any(|d| d.text.contains("diabetes")));
    assert!(auto_docs.iter().any(|d| d.text.contains("Chest pain")));
}

// =============================================================================
// Export / import E2E
// =============================================================================

/// Annotate fixture documents, export to a real JSON file, and import into
/// a fresh ledger built over the same store.
#[test]
fn e2e_json_export_import_round_trip_on_disk() {
    let store = ingest_fixtures();
    let mut ledger = AnnotationLedger::default();

    let text = &store.get("note-100").unwrap().text;
    let start = text.find("Lisinopril").unwrap(); // ASCII text, byte == char
    ledger
        .add_annotation(&store, "note-100", start, start + 10, ["Medication"])
        .unwrap();
    ledger
        .add_annotation(&store, "note-100", 0, 8, ["Test", "Other"])
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.json");
    let file = fs::File::create(&path).unwrap();
    let written = export::export_json(&store, &ledger, file, &path).unwrap();
    assert_eq!(written, 2);

    let data = fs::read_to_string(&path).unwrap();
    let mut fresh = AnnotationLedger::default();
    let imported = export::import_json(&store, &mut fresh, &data).unwrap();
    assert_eq!(imported, 2);

    let original: Vec<_> = ledger
        .annotations()
        .map(|a| (a.doc_id.clone(), a.start, a.end, a.labels.clone()))
        .collect();
    let restored: Vec<_> = fresh
        .annotations()
        .map(|a| (a.doc_id.clone(), a.start, a.end, a.labels.clone()))
        .collect();
    assert_eq!(original, restored);
}

/// CSV round trip through a real file, including a multibyte document where
/// character and byte offsets diverge.
#[test]
fn e2e_csv_export_import_handles_multibyte_text() {
    let mut store = DocumentStore::new();
    store
        .add_document_with_id("note-é", "café au lait allergy noted")
        .unwrap();
    let mut ledger = AnnotationLedger::default();
    // "allergy" is chars 13..20; byte offsets would differ because of 'é'.
    ledger
        .add_annotation(&store, "note-é", 13, 20, ["Symptom"])
        .unwrap();
    assert_eq!(
        span_text(&store.get("note-é").unwrap().text, 13, 20),
        Some("allergy")
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.csv");
    let file = fs::File::create(&path).unwrap();
    export::export_csv(&store, &ledger, file, &path).unwrap();

    let data = fs::read_to_string(&path).unwrap();
    assert!(data.contains("note-é,13,20,allergy,Symptom"));

    let mut fresh = AnnotationLedger::default();
    assert_eq!(export::import_csv(&store, &mut fresh, &data).unwrap(), 1);
    let ann = fresh.annotations().next().unwrap();
    assert_eq!((ann.start, ann.end), (13, 20));
}

/// A hand-tampered export whose span text no longer matches the document
/// must be rejected whole, leaving the ledger untouched.
#[test]
fn e2e_import_rejects_tampered_export() {
    let store = ingest_fixtures();
    let mut ledger = AnnotationLedger::default();
    ledger
        .add_annotation(&store, "note-100", 0, 8, ["Test"])
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annotations.json");
    let file = fs::File::create(&path).unwrap();
    export::export_json(&store, &ledger, file, &path).unwrap();

    // Corrupt the span text on disk.
    let tampered = fs::read_to_string(&path)
        .unwrap()
        .replace("BP 140/9", "BP 999/9");
    let mut fresh = AnnotationLedger::default();
    let err = export::import_json(&store, &mut fresh, &tampered).unwrap_err();
    assert!(matches!(err, ImportError::Validation { index: 0, .. }));
    assert!(fresh.is_empty(), "failed import must not insert anything");
}

// =============================================================================
// Workspace E2E
// =============================================================================

/// Full session round trip: ingest, annotate, save workspace to disk, load
/// it back, and continue annotating with intact id sequences.
#[test]
fn e2e_workspace_round_trip_preserves_session() {
    let store = ingest_fixtures();
    let mut ledger = AnnotationLedger::with_default_labels(';');
    ledger
        .add_annotation(&store, "note-100", 0, 8, ["Test"])
        .unwrap();
    ledger
        .add_annotation(&store, "note-101", 0, 9, ["Other"])
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workspace.json");
    workspace::save(&WorkspaceData::capture(&store, &ledger), &path).unwrap();

    let (restored_store, mut restored_ledger) =
        workspace::load(&path).unwrap().into_session().unwrap();
    assert_eq!(restored_store.len(), 4);
    assert_eq!(restored_ledger.len(), 2);

    // Annotation ids continue above the restored maximum.
    let next = restored_ledger
        .add_annotation(&restored_store, "note-100", 9, 15, ["Test"])
        .unwrap();
    assert_eq!(next.id, 3);

    // The label registry survived with its usage counts.
    let test_uses = restored_ledger
        .labels()
        .iter()
        .find(|l| l.name == "Test")
        .unwrap()
        .uses;
    assert_eq!(test_uses, 2);
}
