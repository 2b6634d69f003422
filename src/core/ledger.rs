// SpanMark - core/ledger.rs
//
// The annotation ledger: the ordered collection of all annotations in the
// current session, plus the label registry with usage counters.
//
// Every mutation is atomic per call: all validation happens before any
// state changes, so a failed operation leaves the ledger exactly as it was.
//
// De-duplication policy: an annotation whose (doc_id, start, end, labels)
// exactly matches an existing one is REJECTED with `LedgerError::Duplicate`
// rather than silently merged. Rejection keeps the ledger an honest record
// of distinct user actions.

use crate::core::model::{Annotation, Document, Relation};
use crate::core::store::DocumentStore;
use crate::util::constants;
use crate::util::error::LedgerError;
use std::collections::BTreeSet;

// =============================================================================
// Label registry
// =============================================================================

/// One known label and its usage statistics.
///
/// `uses` counts how many times the label has been applied over the life of
/// the session. It is a presentation hint (frequently-used-first ordering),
/// not an authoritative invariant, so it is deliberately NOT decremented
/// when an annotation is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEntry {
    /// Label name as shown to the user and serialised on export.
    pub name: String,

    /// Times this label has been applied via `add_annotation` or import.
    pub uses: u64,

    /// Registration order, used as the tie-breaker when sorting by usage.
    first_added: usize,
}

// =============================================================================
// Ledger
// =============================================================================

/// In-memory annotation collection for one session.
#[derive(Debug)]
pub struct AnnotationLedger {
    /// Annotations in insertion order.
    annotations: Vec<Annotation>,

    /// Relations between annotations, in insertion order.
    relations: Vec<Relation>,

    /// Known labels in registration order.
    labels: Vec<LabelEntry>,

    /// Next annotation id to assign. Monotonic; removal never frees an id.
    next_id: u64,

    /// Next relation id to assign. Same monotonic policy.
    next_relation_id: u64,

    /// Active CSV join delimiter. Label names containing it are rejected so
    /// CSV export stays unambiguous.
    label_delimiter: char,
}

impl Default for AnnotationLedger {
    fn default() -> Self {
        Self::new(constants::DEFAULT_LABEL_DELIMITER)
    }
}

impl AnnotationLedger {
    /// Create an empty ledger with no registered labels.
    pub fn new(label_delimiter: char) -> Self {
        Self {
            annotations: Vec::new(),
            relations: Vec::new(),
            labels: Vec::new(),
            next_id: 1,
            next_relation_id: 1,
            label_delimiter,
        }
    }

    /// Create a ledger pre-seeded with the standard clinical label set.
    pub fn with_default_labels(label_delimiter: char) -> Self {
        let mut ledger = Self::new(label_delimiter);
        for name in constants::DEFAULT_LABELS {
            // Default names never trip validation; discard the Ok(bool).
            let _ = ledger.add_label(name);
        }
        ledger
    }

    /// The delimiter used to join labels in CSV exports.
    pub fn label_delimiter(&self) -> char {
        self.label_delimiter
    }

    // -------------------------------------------------------------------------
    // Label management
    // -------------------------------------------------------------------------

    /// Register a label name. Idempotent: registering an existing name is a
    /// no-op returning `Ok(false)`; a new registration returns `Ok(true)`.
    pub fn add_label(&mut self, name: &str) -> Result<bool, LedgerError> {
        let name = name.trim();
        self.validate_label_name(name)?;
        if self.labels.iter().any(|l| l.name == name) {
            return Ok(false);
        }
        let first_added = self.labels.len();
        self.labels.push(LabelEntry {
            name: name.to_string(),
            uses: 0,
            first_added,
        });
        tracing::debug!(label = name, "Label registered");
        Ok(true)
    }

    /// Known labels ordered by descending usage count, ties broken by
    /// first-added order. This is the order label pickers present.
    pub fn labels(&self) -> Vec<&LabelEntry> {
        let mut sorted: Vec<&LabelEntry> = self.labels.iter().collect();
        sorted.sort_by(|a, b| b.uses.cmp(&a.uses).then(a.first_added.cmp(&b.first_added)));
        sorted
    }

    /// Label names in the same frequency-first order as `labels()`.
    pub fn label_names(&self) -> Vec<String> {
        self.labels().iter().map(|l| l.name.clone()).collect()
    }

    fn validate_label_name(&self, name: &str) -> Result<(), LedgerError> {
        if name.is_empty() || name.chars().count() > constants::MAX_LABEL_LENGTH {
            return Err(LedgerError::InvalidLabelName {
                label: name.to_string(),
                max_chars: constants::MAX_LABEL_LENGTH,
            });
        }
        if name.contains(self.label_delimiter) {
            return Err(LedgerError::ReservedDelimiter {
                label: name.to_string(),
                delimiter: self.label_delimiter,
            });
        }
        Ok(())
    }

    fn bump_label_uses(&mut self, labels: &BTreeSet<String>) {
        for name in labels {
            match self.labels.iter_mut().find(|l| &l.name == name) {
                Some(entry) => entry.uses += 1,
                None => {
                    // First sighting of a label that arrived via an
                    // annotation (import, or a freshly typed label): it was
                    // validated by the caller, so register it directly.
                    let first_added = self.labels.len();
                    self.labels.push(LabelEntry {
                        name: name.clone(),
                        uses: 1,
                        first_added,
                    });
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Annotation lifecycle
    // -------------------------------------------------------------------------

    /// Validate a prospective annotation against the store, this ledger's
    /// contents, and the label rules — without mutating anything.
    pub fn validate_new(
        &self,
        store: &DocumentStore,
        doc_id: &str,
        start: usize,
        end: usize,
        labels: &BTreeSet<String>,
    ) -> Result<(), LedgerError> {
        let doc: &Document =
            store
                .get(doc_id)
                .map_err(|_| LedgerError::DocumentNotFound {
                    doc_id: doc_id.to_string(),
                })?;

        let doc_chars = doc.char_len();
        if start >= end || end > doc_chars {
            return Err(LedgerError::InvalidSpan {
                doc_id: doc_id.to_string(),
                start,
                end,
                doc_chars,
            });
        }

        if labels.is_empty() {
            return Err(LedgerError::EmptyLabels);
        }
        for label in labels {
            self.validate_label_name(label)?;
        }

        let duplicate = self.annotations.iter().any(|a| {
            a.doc_id == doc_id && a.start == start && a.end == end && &a.labels == labels
        });
        if duplicate {
            return Err(LedgerError::Duplicate {
                doc_id: doc_id.to_string(),
                start,
                end,
            });
        }

        Ok(())
    }

    /// Create a new annotation.
    ///
    /// Validates document existence, span bounds, and the label set, then
    /// appends the record with a freshly assigned id and bumps the usage
    /// counter of every applied label. On any validation failure the ledger
    /// is left unchanged.
    pub fn add_annotation<I, S>(
        &mut self,
        store: &DocumentStore,
        doc_id: &str,
        start: usize,
        end: usize,
        labels: I,
    ) -> Result<&Annotation, LedgerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: BTreeSet<String> = labels
            .into_iter()
            .map(|s| s.into().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        self.validate_new(store, doc_id, start, end, &labels)?;

        let id = self.next_id;
        self.next_id += 1;
        self.bump_label_uses(&labels);
        self.annotations.push(Annotation {
            id,
            doc_id: doc_id.to_string(),
            start,
            end,
            labels,
        });

        let ann = self.annotations.last().unwrap_or_else(|| unreachable!());
        tracing::debug!(
            annotation_id = ann.id,
            doc_id = %ann.doc_id,
            start = ann.start,
            end = ann.end,
            label_count = ann.labels.len(),
            "Annotation added"
        );
        Ok(ann)
    }

    /// Remove an annotation by id, returning the removed record. Relations
    /// referencing the annotation are dropped with it.
    ///
    /// Removal is NOT idempotent: a second call for the same id fails with
    /// `AnnotationNotFound`.
    pub fn remove_annotation(&mut self, id: u64) -> Result<Annotation, LedgerError> {
        let idx = self
            .annotations
            .iter()
            .position(|a| a.id == id)
            .ok_or(LedgerError::AnnotationNotFound { id })?;
        let removed = self.annotations.remove(idx);
        let before = self.relations.len();
        self.relations.retain(|r| r.head != id && r.tail != id);
        tracing::debug!(
            annotation_id = id,
            doc_id = %removed.doc_id,
            relations_dropped = before - self.relations.len(),
            "Annotation removed"
        );
        Ok(removed)
    }

    /// Drop every annotation and relation referencing `doc_id` (document
    /// deletion). Returns the number of annotations removed.
    pub fn remove_document_annotations(&mut self, doc_id: &str) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.doc_id != doc_id);
        self.relations.retain(|r| r.doc_id != doc_id);
        before - self.annotations.len()
    }

    // -------------------------------------------------------------------------
    // Relation lifecycle
    // -------------------------------------------------------------------------

    /// Link two annotations with a labelled relation.
    ///
    /// Both annotations must exist and belong to the same document; a
    /// relation cannot link an annotation to itself, and an exact
    /// `(head, tail, label)` duplicate is rejected. Atomic like
    /// `add_annotation`: failure leaves the ledger unchanged.
    pub fn add_relation(
        &mut self,
        head: u64,
        tail: u64,
        label: &str,
    ) -> Result<&Relation, LedgerError> {
        let label = label.trim();
        if label.is_empty() || label.chars().count() > constants::MAX_LABEL_LENGTH {
            return Err(LedgerError::InvalidLabelName {
                label: label.to_string(),
                max_chars: constants::MAX_LABEL_LENGTH,
            });
        }
        if head == tail {
            return Err(LedgerError::SelfRelation { annotation: head });
        }
        let head_doc = self.get(head)?.doc_id.clone();
        let tail_doc = &self.get(tail)?.doc_id;
        if &head_doc != tail_doc {
            return Err(LedgerError::CrossDocumentRelation { head, tail });
        }
        let duplicate = self
            .relations
            .iter()
            .any(|r| r.head == head && r.tail == tail && r.label == label);
        if duplicate {
            return Err(LedgerError::DuplicateRelation { head, tail });
        }

        let id = self.next_relation_id;
        self.next_relation_id += 1;
        self.relations.push(Relation {
            id,
            doc_id: head_doc,
            head,
            tail,
            label: label.to_string(),
        });

        let rel = self.relations.last().unwrap_or_else(|| unreachable!());
        tracing::debug!(
            relation_id = rel.id,
            doc_id = %rel.doc_id,
            head,
            tail,
            label = %rel.label,
            "Relation added"
        );
        Ok(rel)
    }

    /// Remove a relation by id, returning the removed record.
    pub fn remove_relation(&mut self, id: u64) -> Result<Relation, LedgerError> {
        let idx = self
            .relations
            .iter()
            .position(|r| r.id == id)
            .ok_or(LedgerError::RelationNotFound { id })?;
        let removed = self.relations.remove(idx);
        tracing::debug!(relation_id = id, doc_id = %removed.doc_id, "Relation removed");
        Ok(removed)
    }

    /// All relations in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }

    /// Relations within one document, in insertion order.
    pub fn relations_for<'a>(&'a self, doc_id: &'a str) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations.iter().filter(move |r| r.doc_id == doc_id)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// All annotations in insertion order.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// Annotations for one document, in insertion order.
    pub fn annotations_for<'a>(
        &'a self,
        doc_id: &'a str,
    ) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.annotations.iter().filter(move |a| a.doc_id == doc_id)
    }

    /// Look up an annotation by id.
    pub fn get(&self, id: u64) -> Result<&Annotation, LedgerError> {
        self.annotations
            .iter()
            .find(|a| a.id == id)
            .ok_or(LedgerError::AnnotationNotFound { id })
    }

    /// Total number of annotations.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// True if the ledger holds no annotations.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    // -------------------------------------------------------------------------
    // Batch insertion (import, workspace restore)
    // -------------------------------------------------------------------------

    /// Insert a batch of prospective annotations atomically.
    ///
    /// Every record is validated (against the store, the existing ledger,
    /// and the records earlier in the batch) before ANY record is inserted.
    /// On failure the error carries the zero-based index of the offending
    /// record and the ledger is unchanged. Returns the number inserted.
    pub fn add_batch(
        &mut self,
        store: &DocumentStore,
        batch: Vec<(String, usize, usize, BTreeSet<String>)>,
    ) -> Result<usize, (usize, LedgerError)> {
        for (idx, (doc_id, start, end, labels)) in batch.iter().enumerate() {
            self.validate_new(store, doc_id, *start, *end, labels)
                .map_err(|e| (idx, e))?;

            // Intra-batch duplicate check: validate_new only sees records
            // already committed to the ledger.
            let clash = batch[..idx].iter().any(|(d, s, e, l)| {
                d == doc_id && s == start && e == end && l == labels
            });
            if clash {
                return Err((
                    idx,
                    LedgerError::Duplicate {
                        doc_id: doc_id.clone(),
                        start: *start,
                        end: *end,
                    },
                ));
            }
        }

        let inserted = batch.len();
        for (doc_id, start, end, labels) in batch {
            let id = self.next_id;
            self.next_id += 1;
            self.bump_label_uses(&labels);
            self.annotations.push(Annotation {
                id,
                doc_id,
                start,
                end,
                labels,
            });
        }
        tracing::debug!(inserted, "Annotation batch added");
        Ok(inserted)
    }

    /// Rebuild a ledger from persisted parts (workspace load).
    ///
    /// Annotation and relation ids are kept as stored; the id counters
    /// resume above the highest seen. Label usage counters are restored as
    /// persisted, then topped up with zero-use entries for any label that
    /// appears only on annotations. The caller is responsible for having
    /// validated the records against the document store first.
    pub fn restore(
        annotations: Vec<Annotation>,
        relations: Vec<Relation>,
        labels: Vec<(String, u64)>,
        label_delimiter: char,
    ) -> Self {
        let mut ledger = Self::new(label_delimiter);
        for (name, uses) in labels {
            if ledger.add_label(&name).unwrap_or(false) {
                if let Some(entry) = ledger.labels.last_mut() {
                    entry.uses = uses;
                }
            }
        }
        ledger.next_id = annotations.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        ledger.next_relation_id = relations.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        for ann in &annotations {
            for name in &ann.labels {
                if !ledger.labels.iter().any(|l| &l.name == name) {
                    let _ = ledger.add_label(name);
                }
            }
        }
        ledger.annotations = annotations;
        ledger.relations = relations;
        ledger
    }
}

// =============================================================================
// Tests
// =============================================================================
