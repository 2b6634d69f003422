// SpanMark - core/store.rs
//
// The document store: the ordered set of documents loaded into the current
// session. Insertion order is preserved for listing; lookup by id is O(1).

use crate::core::model::Document;
use crate::util::constants;
use crate::util::error::StoreError;
use std::collections::HashMap;

/// In-memory document collection for one annotation session.
#[derive(Debug, Default)]
pub struct DocumentStore {
    /// Documents in insertion order.
    docs: Vec<Document>,

    /// Id -> index into `docs`.
    index: HashMap<String, usize>,

    /// Sequence counter for auto-assigned ids. Monotonic across removals so
    /// a deleted `doc_0003` is never reused for a different text.
    next_seq: usize,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document with an auto-assigned sequence id (`doc_0001`, ...).
    ///
    /// Fails with `EmptyInput` if the text is blank after trimming and with
    /// `TooManyDocuments` once the session cap is reached. Sequence numbers
    /// already taken by caller-supplied ids (e.g. a CSV row named
    /// `doc_0002`) are skipped, so auto-assignment always makes progress.
    pub fn add_document(&mut self, text: impl Into<String>) -> Result<&Document, StoreError> {
        loop {
            let seq = self.next_seq + 1;
            let id = format!("doc_{seq:0width$}", width = constants::DOC_ID_PAD_WIDTH);
            if !self.index.contains_key(&id) {
                return self.add_document_with_id(id, text);
            }
            self.next_seq += 1;
        }
    }

    /// Add a document under a caller-supplied id (e.g. from a CSV id column).
    ///
    /// Fails with `DuplicateId` if the id is already in use.
    pub fn add_document_with_id(
        &mut self,
        id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<&Document, StoreError> {
        let id = id.into();
        let text = text.into();

        if text.trim().is_empty() {
            return Err(StoreError::EmptyInput);
        }
        if self.index.contains_key(&id) {
            return Err(StoreError::DuplicateId { id });
        }
        if self.docs.len() >= constants::MAX_DOCUMENTS {
            return Err(StoreError::TooManyDocuments {
                max: constants::MAX_DOCUMENTS,
            });
        }

        self.next_seq += 1;
        self.index.insert(id.clone(), self.docs.len());
        self.docs.push(Document { id, text });

        let doc = self.docs.last().unwrap_or_else(|| unreachable!());
        tracing::debug!(doc_id = %doc.id, chars = doc.char_len(), "Document added");
        Ok(doc)
    }

    /// Look up a document by id.
    pub fn get(&self, id: &str) -> Result<&Document, StoreError> {
        self.index
            .get(id)
            .map(|&i| &self.docs[i])
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    /// True if a document with this id is loaded.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Documents in insertion order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }

    /// Number of loaded documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True if no documents are loaded.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Remove a document, returning it.
    ///
    /// The caller is responsible for first dropping any annotations that
    /// reference it (see `AnnotationLedger::remove_document_annotations`).
    pub fn remove(&mut self, id: &str) -> Result<Document, StoreError> {
        let idx = *self
            .index
            .get(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        let doc = self.docs.remove(idx);
        self.index.remove(id);
        // Reindex everything after the removed slot.
        for (i, d) in self.docs.iter().enumerate().skip(idx) {
            self.index.insert(d.id.clone(), i);
        }
        tracing::debug!(doc_id = %doc.id, "Document removed");
        Ok(doc)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_assigns_sequence_ids_in_order() {
        let mut store = DocumentStore::new();
        let a = store.add_document("first note").unwrap().id.clone();
        let b = store.add_document("second note").unwrap().id.clone();
        assert_eq!(a, "doc_0001");
        assert_eq!(b, "doc_0002");

        let listed: Vec<_> = store.documents().map(|d| d.id.clone()).collect();
        assert_eq!(listed, vec!["doc_0001", "doc_0002"]);
    }

    #[test]
    fn test_add_rejects_blank_text() {
        let mut store = DocumentStore::new();
        assert!(matches!(
            store.add_document("   \n\t  "),
            Err(StoreError::EmptyInput)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut store = DocumentStore::new();
        store.add_document_with_id("note-1", "text one").unwrap();
        assert!(matches!(
            store.add_document_with_id("note-1", "text two"),
            Err(StoreError::DuplicateId { .. })
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("note-1").unwrap().text, "text one");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = DocumentStore::new();
        assert!(matches!(
            store.get("ghost"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_keeps_lookup_consistent() {
        let mut store = DocumentStore::new();
        store.add_document("one").unwrap();
        store.add_document("two").unwrap();
        store.add_document("three").unwrap();

        store.remove("doc_0002").unwrap();
        assert_eq!(store.len(), 2);
        assert!(!store.contains("doc_0002"));
        // Later documents must still resolve after reindexing.
        assert_eq!(store.get("doc_0003").unwrap().text, "three");
        // Removal is not idempotent.
        assert!(store.remove("doc_0002").is_err());
    }

    #[test]
    fn test_auto_ids_skip_ids_taken_by_csv_rows() {
        let mut store = DocumentStore::new();
        // A caller-supplied id squats on the next auto sequence number.
        store.add_document_with_id("doc_0002", "csv row").unwrap();

        let a = store.add_document("first auto").unwrap().id.clone();
        let b = store.add_document("second auto").unwrap().id.clone();
        assert_ne!(a, "doc_0002");
        assert_ne!(b, "doc_0002");
        assert_ne!(a, b);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_sequence_ids_not_reused_after_removal() {
        let mut store = DocumentStore::new();
        store.add_document("one").unwrap();
        store.remove("doc_0001").unwrap();
        let id = store.add_document("two").unwrap().id.clone();
        assert_eq!(id, "doc_0002", "removed ids must not be recycled");
    }
}
