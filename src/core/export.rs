// SpanMark - core/export.rs
//
// JSON and CSV serialisation of the annotation ledger, and the inverse
// import path. Core layer: reads/writes any Write/str, no file dialogs.
//
// Field layout (both formats): doc_id, start, end, text, labels — where
// `text` is the span substring recomputed from the document store at export
// time, and `labels` is an array (JSON) or a delimiter-joined string (CSV,
// one row per annotation; the delimiter is configurable and reserved out of
// label names at creation time).
//
// Import is atomic: every record is parsed and validated before any is
// inserted, so a malformed file can never leave a half-imported ledger.

use crate::core::ledger::AnnotationLedger;
use crate::core::model::span_text;
use crate::core::store::DocumentStore;
use crate::util::error::{ExportError, ImportError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// CSV header, in column order.
const CSV_HEADER: [&str; 5] = ["doc_id", "start", "end", "text", "labels"];

/// One serialised annotation, as written to and read from export files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    pub doc_id: String,
    pub start: usize,
    pub end: usize,
    /// Span substring, included so exports are readable without the source
    /// documents. Checked against the store on import.
    pub text: String,
    pub labels: Vec<String>,
}

/// Build the export records for every annotation in insertion order.
fn collect_records(store: &DocumentStore, ledger: &AnnotationLedger) -> Vec<ExportRecord> {
    ledger
        .annotations()
        .filter_map(|ann| {
            let doc = match store.get(&ann.doc_id) {
                Ok(d) => d,
                Err(_) => {
                    // Ledger invariants make this unreachable in normal
                    // operation; skip rather than abort the whole export.
                    tracing::warn!(doc_id = %ann.doc_id, "Annotation references missing document; skipped");
                    return None;
                }
            };
            let text = span_text(&doc.text, ann.start, ann.end)
                .unwrap_or_default()
                .to_string();
            Some(ExportRecord {
                doc_id: ann.doc_id.clone(),
                start: ann.start,
                end: ann.end,
                text,
                labels: ann.labels.iter().cloned().collect(),
            })
        })
        .collect()
}

// =============================================================================
// Export
// =============================================================================

/// Export all annotations as a JSON array of objects.
/// Returns the number of records written.
pub fn export_json<W: Write>(
    store: &DocumentStore,
    ledger: &AnnotationLedger,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let records = collect_records(store, ledger);
    serde_json::to_writer_pretty(writer, &records).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(records.len())
}

/// Export all annotations as CSV, one row per annotation, labels joined by
/// the ledger's configured delimiter. Returns the number of rows written.
pub fn export_csv<W: Write>(
    store: &DocumentStore,
    ledger: &AnnotationLedger,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let delimiter = ledger.label_delimiter().to_string();
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(CSV_HEADER)
        .map_err(|e| ExportError::Csv {
            path: export_path.to_path_buf(),
            source: e,
        })?;

    let mut count = 0;
    for record in collect_records(store, ledger) {
        csv_writer
            .write_record([
                &record.doc_id,
                &record.start.to_string(),
                &record.end.to_string(),
                &record.text,
                &record.labels.join(&delimiter),
            ])
            .map_err(|e| ExportError::Csv {
                path: export_path.to_path_buf(),
                source: e,
            })?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

// =============================================================================
// Import
// =============================================================================

/// Parse a JSON export and insert its annotations into the ledger.
/// Returns the number imported.
pub fn import_json(
    store: &DocumentStore,
    ledger: &mut AnnotationLedger,
    data: &str,
) -> Result<usize, ImportError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(data).map_err(|e| ImportError::Parse {
            index: 0,
            reason: format!("not a JSON array of annotation objects: {e}"),
        })?;

    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        let record: ExportRecord =
            serde_json::from_value(value).map_err(|e| ImportError::Parse {
                index,
                reason: e.to_string(),
            })?;
        records.push(record);
    }

    insert_records(store, ledger, records)
}

/// Parse a CSV export and insert its annotations into the ledger.
/// Returns the number imported. Record indices in errors are zero-based
/// data-row indices (the header row is not counted).
pub fn import_csv(
    store: &DocumentStore,
    ledger: &mut AnnotationLedger,
    data: &str,
) -> Result<usize, ImportError> {
    let delimiter = ledger.label_delimiter();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(false)
        .from_reader(data.as_bytes());

    // Column positions are resolved from the header so column reordering by
    // a spreadsheet round-trip does not break the import.
    let headers = reader
        .headers()
        .map_err(|e| ImportError::Parse {
            index: 0,
            reason: format!("cannot read CSV header: {e}"),
        })?
        .clone();
    let mut positions = [0usize; 5];
    for (slot, name) in CSV_HEADER.iter().enumerate() {
        positions[slot] = headers
            .iter()
            .position(|h| h == *name)
            .ok_or_else(|| ImportError::Parse {
                index: 0,
                reason: format!("missing required column '{name}'"),
            })?;
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| ImportError::Parse {
            index,
            reason: e.to_string(),
        })?;

        let field = |slot: usize| -> Result<&str, ImportError> {
            row.get(positions[slot]).ok_or_else(|| ImportError::Parse {
                index,
                reason: format!("missing field '{}'", CSV_HEADER[slot]),
            })
        };

        let doc_id = field(0)?.to_string();
        let start: usize = field(1)?.parse().map_err(|e| ImportError::Parse {
            index,
            reason: format!("start is not a valid offset: {e}"),
        })?;
        let end: usize = field(2)?.parse().map_err(|e| ImportError::Parse {
            index,
            reason: format!("end is not a valid offset: {e}"),
        })?;
        let text = field(3)?.to_string();
        let labels: Vec<String> = field(4)?
            .split(delimiter)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        records.push(ExportRecord {
            doc_id,
            start,
            end,
            text,
            labels,
        });
    }

    insert_records(store, ledger, records)
}

/// Validate parsed records and insert them atomically.
fn insert_records(
    store: &DocumentStore,
    ledger: &mut AnnotationLedger,
    records: Vec<ExportRecord>,
) -> Result<usize, ImportError> {
    let mut batch = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        // The span-text check only applies when the referenced document is
        // loaded; a missing document is reported by ledger validation below.
        if let Ok(doc) = store.get(&record.doc_id) {
            if let Some(actual) = span_text(&doc.text, record.start, record.end) {
                if actual != record.text {
                    return Err(ImportError::Validation {
                        index,
                        reason: format!(
                            "span text '{}' does not match document content '{actual}' \
                             at [{}, {})",
                            record.text, record.start, record.end
                        ),
                    });
                }
            }
        }

        let labels: BTreeSet<String> = record.labels.into_iter().collect();
        batch.push((record.doc_id, record.start, record.end, labels));
    }

    ledger
        .add_batch(store, batch)
        .map_err(|(index, e)| ImportError::Validation {
            index,
            reason: e.to_string(),
        })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_session() -> (DocumentStore, AnnotationLedger) {
        let mut store = DocumentStore::new();
        store
            .add_document_with_id("doc1", "Patient has diabetes.")
            .unwrap();
        store
            .add_document_with_id("doc2", "Chest pain on exertion, resolved at rest.")
            .unwrap();

        let mut ledger = AnnotationLedger::default();
        ledger
            .add_annotation(&store, "doc1", 12, 20, ["Diagnosis"])
            .unwrap();
        ledger
            .add_annotation(&store, "doc2", 0, 10, ["Symptom", "Other"])
            .unwrap();
        (store, ledger)
    }

    fn out_path() -> PathBuf {
        PathBuf::from("out")
    }

    #[test]
    fn test_json_export_field_layout() {
        let (store, ledger) = sample_session();
        let mut buf = Vec::new();
        let count = export_json(&store, &ledger, &mut buf, &out_path()).unwrap();
        assert_eq!(count, 2);

        let parsed: Vec<serde_json::Value> =
            serde_json::from_slice(&buf).expect("export must be valid JSON");
        assert_eq!(parsed[0]["doc_id"], "doc1");
        assert_eq!(parsed[0]["start"], 12);
        assert_eq!(parsed[0]["end"], 20);
        assert_eq!(parsed[0]["text"], "diabetes");
        assert_eq!(parsed[0]["labels"][0], "Diagnosis");
    }

    #[test]
    fn test_csv_export_joins_labels() {
        let (store, ledger) = sample_session();
        let mut buf = Vec::new();
        let count = export_csv(&store, &ledger, &mut buf, &out_path()).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        let mut lines = output.lines();
        assert_eq!(lines.next(), Some("doc_id,start,end,text,labels"));
        assert!(output.contains("doc1,12,20,diabetes,Diagnosis"));
        // BTreeSet ordering: "Other" sorts before "Symptom".
        assert!(output.contains("Other;Symptom"));
    }

    #[test]
    fn test_json_round_trip() {
        let (store, ledger) = sample_session();
        let mut buf = Vec::new();
        export_json(&store, &ledger, &mut buf, &out_path()).unwrap();

        let mut fresh = AnnotationLedger::default();
        let imported =
            import_json(&store, &mut fresh, std::str::from_utf8(&buf).unwrap()).unwrap();
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

    #[test]
    fn test_csv_round_trip() {
        let (store, ledger) = sample_session();
        let mut buf = Vec::new();
        export_csv(&store, &ledger, &mut buf, &out_path()).unwrap();

        let mut fresh = AnnotationLedger::default();
        let imported =
            import_csv(&store, &mut fresh, std::str::from_utf8(&buf).unwrap()).unwrap();
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

    #[test]
    fn test_import_reports_offending_record_index() {
        let (store, _) = sample_session();
        let mut ledger = AnnotationLedger::default();

        // Second object is missing `end`.
        let data = r#"[
            {"doc_id":"doc1","start":12,"end":20,"text":"diabetes","labels":["Diagnosis"]},
            {"doc_id":"doc1","start":0,"text":"Patient","labels":["Other"]}
        ]"#;
        let err = import_json(&store, &mut ledger, data).unwrap_err();
        match err {
            ImportError::Parse { index, .. } => assert_eq!(index, 1),
            other => panic!("expected Parse error, got {other:?}"),
        }
        assert!(ledger.is_empty(), "failed import must not insert anything");
    }

    #[test]
    fn test_import_rejects_span_text_mismatch() {
        let (store, _) = sample_session();
        let mut ledger = AnnotationLedger::default();
        let data = r#"[
            {"doc_id":"doc1","start":12,"end":20,"text":"hypertension","labels":["Diagnosis"]}
        ]"#;
        let err = import_json(&store, &mut ledger, data).unwrap_err();
        assert!(matches!(err, ImportError::Validation { index: 0, .. }));
    }

    #[test]
    fn test_import_rejects_unknown_document() {
        let (store, _) = sample_session();
        let mut ledger = AnnotationLedger::default();
        let data = r#"[
            {"doc_id":"ghost","start":0,"end":3,"text":"abc","labels":["Other"]}
        ]"#;
        let err = import_json(&store, &mut ledger, data).unwrap_err();
        assert!(matches!(err, ImportError::Validation { index: 0, .. }));
    }

    #[test]
    fn test_import_csv_missing_column() {
        let (store, _) = sample_session();
        let mut ledger = AnnotationLedger::default();
        let data = "doc_id,start,end,text\ndoc1,12,20,diabetes\n";
        let err = import_csv(&store, &mut ledger, data).unwrap_err();
        match err {
            ImportError::Parse { reason, .. } => {
                assert!(reason.contains("labels"), "reason was: {reason}")
            }
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_import_csv_tolerates_reordered_columns() {
        let (store, _) = sample_session();
        let mut ledger = AnnotationLedger::default();
        let data = "labels,text,end,start,doc_id\nDiagnosis,diabetes,20,12,doc1\n";
        let imported = import_csv(&store, &mut ledger, data).unwrap();
        assert_eq!(imported, 1);
        let ann = ledger.annotations().next().unwrap();
        assert_eq!((ann.start, ann.end), (12, 20));
    }

    #[test]
    fn test_export_empty_ledger() {
        let store = DocumentStore::new();
        let ledger = AnnotationLedger::default();

        let mut buf = Vec::new();
        assert_eq!(export_json(&store, &ledger, &mut buf, &out_path()).unwrap(), 0);
        assert_eq!(String::from_utf8(buf).unwrap(), "[]");

        let mut buf = Vec::new();
        assert_eq!(export_csv(&store, &ledger, &mut buf, &out_path()).unwrap(), 0);
        assert_eq!(
            String::from_utf8(buf).unwrap().trim_end(),
            "doc_id,start,end,text,labels"
        );
    }
}
