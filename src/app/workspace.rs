// SpanMark - app/workspace.rs
//
// Workspace persistence: save and restore the full session (documents,
// annotations, label registry) as a single JSON file.
//
// Design principles:
// - Saves are atomic (write→temp, rename→final) so a crash during save
//   never corrupts the previous good workspace.
// - Loading is all-or-nothing: a malformed or version-mismatched file is
//   rejected whole rather than partially applied to a live session.
// - The workspace file carries the full document text, so a workspace is
//   self-contained and portable between machines.

use crate::core::ledger::AnnotationLedger;
use crate::core::model::{Annotation, Document, Relation};
use crate::core::store::DocumentStore;
use crate::util::constants::WORKSPACE_VERSION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// On-disk data structures
// =============================================================================

/// Complete persistent workspace snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkspaceData {
    /// Schema version — must equal `WORKSPACE_VERSION` to be accepted.
    pub version: u32,

    /// When the workspace was saved.
    pub saved_at: DateTime<Utc>,

    /// CSV label join delimiter active when the workspace was saved,
    /// restored so label-name validation stays consistent.
    pub label_delimiter: char,

    /// All documents, in store order, with full text.
    pub documents: Vec<Document>,

    /// All annotations, in ledger order, with original ids.
    pub annotations: Vec<Annotation>,

    /// All relations between annotations, in ledger order.
    #[serde(default)]
    pub relations: Vec<Relation>,

    /// Label registry as `(name, uses)` pairs in registration order.
    #[serde(default)]
    pub labels: Vec<(String, u64)>,
}

impl WorkspaceData {
    /// Snapshot the current store and ledger.
    pub fn capture(store: &DocumentStore, ledger: &AnnotationLedger) -> Self {
        let mut labels: Vec<(String, u64)> = ledger
            .labels()
            .iter()
            .map(|l| (l.name.clone(), l.uses))
            .collect();
        // labels() is frequency-ordered for pickers; persist alphabetically
        // so saved files diff cleanly.
        labels.sort();

        Self {
            version: WORKSPACE_VERSION,
            saved_at: Utc::now(),
            label_delimiter: ledger.label_delimiter(),
            documents: store.documents().cloned().collect(),
            annotations: ledger.annotations().cloned().collect(),
            relations: ledger.relations().cloned().collect(),
            labels,
        }
    }

    /// Rebuild a store and ledger from this snapshot.
    ///
    /// Every record is re-validated against the restored documents: a
    /// hand-edited file with a blank or duplicate document, an out-of-bounds
    /// or inverted span, an unlabelled annotation, or a relation pointing at
    /// a missing annotation is rejected whole, so a load can never install
    /// annotations the live ledger would have refused to create.
    pub fn into_session(self) -> Result<(DocumentStore, AnnotationLedger), String> {
        let mut store = DocumentStore::new();
        for doc in self.documents {
            store
                .add_document_with_id(doc.id, doc.text)
                .map_err(|e| format!("workspace document rejected: {e}"))?;
        }

        for (idx, ann) in self.annotations.iter().enumerate() {
            let doc = store
                .get(&ann.doc_id)
                .map_err(|e| format!("workspace annotation {idx} rejected: {e}"))?;
            let doc_chars = doc.char_len();
            if ann.start >= ann.end || ann.end > doc_chars {
                return Err(format!(
                    "workspace annotation {idx} rejected: span [{}, {}) is invalid \
                     for document '{}' ({doc_chars} characters)",
                    ann.start, ann.end, ann.doc_id
                ));
            }
            if ann.labels.is_empty() {
                return Err(format!(
                    "workspace annotation {idx} rejected: no labels"
                ));
            }
        }

        for (idx, rel) in self.relations.iter().enumerate() {
            for end in [rel.head, rel.tail] {
                let found = self
                    .annotations
                    .iter()
                    .any(|a| a.id == end && a.doc_id == rel.doc_id);
                if !found {
                    return Err(format!(
                        "workspace relation {idx} rejected: annotation {end} does not \
                         exist in document '{}'",
                        rel.doc_id
                    ));
                }
            }
        }

        let ledger = AnnotationLedger::restore(
            self.annotations,
            self.relations,
            self.labels,
            self.label_delimiter,
        );
        Ok((store, ledger))
    }
}

// =============================================================================
// I/O helpers
// =============================================================================

/// Save `data` to `path` atomically (write temp → rename).
///
/// Creates all parent directories as needed. Returns a descriptive error
/// string for the status bar.
pub fn save(data: &WorkspaceData, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!(
                "cannot create workspace directory '{}': {e}",
                parent.display()
            )
        })?;
    }

    let json = serde_json::to_string_pretty(data)
        .map_err(|e| format!("failed to serialise workspace: {e}"))?;

    // Atomic write: a crash between write and rename loses the new save but
    // never corrupts the previous one.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes()).map_err(|e| {
        format!(
            "failed to write workspace temp file '{}': {e}",
            tmp.display()
        )
    })?;

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        format!("failed to finalise workspace file '{}': {e}", path.display())
    })?;

    tracing::info!(
        path = %path.display(),
        documents = data.documents.len(),
        annotations = data.annotations.len(),
        "Workspace saved"
    );
    Ok(())
}

/// Load and validate a `WorkspaceData` from `path`.
///
/// Returns a descriptive error string on any failure (missing file,
/// malformed JSON, version mismatch); the user picked this file explicitly,
/// so failures are surfaced rather than silently discarded.
pub fn load(path: &Path) -> Result<WorkspaceData, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read workspace file '{}': {e}", path.display()))?;

    let data: WorkspaceData = serde_json::from_str(&content)
        .map_err(|e| format!("workspace file '{}' is malformed: {e}", path.display()))?;

    if data.version != WORKSPACE_VERSION {
        return Err(format!(
            "workspace file '{}' has version {} but this build expects {}",
            path.display(),
            data.version,
            WORKSPACE_VERSION
        ));
    }

    tracing::info!(
        path = %path.display(),
        documents = data.documents.len(),
        annotations = data.annotations.len(),
        "Workspace loaded"
    );
    Ok(data)
}

// =============================================================================
// Unit tests
// =============================================================================
