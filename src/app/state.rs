// SpanMark - app/state.rs
//
// Application state management. Holds the document store, the annotation
// ledger, the current selection, the annotation draft, and search state.
// Owned by the eframe::App implementation; all mutations flow through the
// methods here so the UI panels stay declarative.

use crate::app::ingest::{self, FolderConfig};
use crate::app::search::{self, SearchResults};
use crate::app::workspace::{self, WorkspaceData};
use crate::core::ingest::{IngestConfig, TextExtractor};
use crate::core::ledger::AnnotationLedger;
use crate::core::model::{Document, IngestSummary};
use crate::core::store::DocumentStore;
use crate::core::{export, ingest as core_ingest};
use crate::platform::config::AppConfig;
use crate::platform::pdf::PdfTextExtractor;
use crate::util::constants;
use std::collections::BTreeSet;
use std::path::Path;

// =============================================================================
// Sub-state
// =============================================================================

/// The in-progress annotation being composed in the annotate panel.
#[derive(Debug, Default)]
pub struct SpanDraft {
    /// Span start offset as typed (characters).
    pub start_input: String,

    /// Span end offset as typed (characters).
    pub end_input: String,

    /// Labels ticked in the label picker.
    pub selected_labels: BTreeSet<String>,

    /// Free-text field for registering a new label.
    pub new_label_input: String,
}

impl SpanDraft {
    /// Reset the span fields, keeping the label selection for the common
    /// case of annotating several spans with the same labels.
    pub fn clear_span(&mut self) {
        self.start_input.clear();
        self.end_input.clear();
    }
}

/// The in-progress relation being composed in the annotate panel.
#[derive(Debug, Default)]
pub struct RelationDraft {
    /// Head annotation id as typed.
    pub head_input: String,

    /// Tail annotation id as typed.
    pub tail_input: String,

    /// Relation label as typed; blank falls back to the default label.
    pub label_input: String,
}

impl RelationDraft {
    pub fn clear(&mut self) {
        self.head_input.clear();
        self.tail_input.clear();
    }
}

/// Search panel state.
#[derive(Debug, Default)]
pub struct SearchState {
    /// Query as typed.
    pub query: String,

    /// Results of the last run.
    pub results: SearchResults,

    /// Index of the focused match within `results.matches`.
    pub current: Option<usize>,
}

// =============================================================================
// AppState
// =============================================================================

/// Top-level application state.
#[derive(Debug)]
pub struct AppState {
    /// Validated configuration from config.toml.
    pub config: AppConfig,

    /// Loaded documents.
    pub store: DocumentStore,

    /// Annotations and the label registry.
    pub ledger: AnnotationLedger,

    /// Id of the document open in the viewer.
    pub selected_doc: Option<String>,

    /// The annotation being composed.
    pub draft: SpanDraft,

    /// The relation being composed.
    pub relation_draft: RelationDraft,

    /// Search panel state.
    pub search: SearchState,

    /// Text area content for the paste-text dialog.
    pub paste_input: String,

    /// Whether the paste-text dialog is open.
    pub show_paste_dialog: bool,

    /// Status message for the status bar.
    pub status_message: String,

    /// Non-fatal warnings accumulated during the session.
    pub warnings: Vec<String>,

    /// Whether to show the warnings dialog.
    pub show_warnings: bool,

    /// Summary of the most recent ingest, shown in a dialog.
    pub last_summary: Option<IngestSummary>,

    /// Whether debug mode is enabled.
    pub debug_mode: bool,

    /// PDF extractor handle, resolved once at startup.
    extractor: Extractor,
}

/// Extractor handle passed into ingestion. `Unavailable` stands in when
/// pdftotext is not installed so PDF files fail with a clear message
/// instead of disabling folder ingestion entirely.
#[derive(Debug, Clone)]
enum Extractor {
    Pdf(PdfTextExtractor),
    Unavailable,
}

impl TextExtractor for Extractor {
    fn extract(&self, path: &Path) -> Result<String, crate::util::error::ExtractionError> {
        match self {
            Self::Pdf(e) => e.extract(path),
            Self::Unavailable => Err(crate::util::error::ExtractionError::Failed {
                path: path.to_path_buf(),
                detail: "pdftotext is not installed".to_string(),
            }),
        }
    }
}

impl AppState {
    /// Create initial state. Locates the PDF extractor and seeds the ledger
    /// with the default clinical labels.
    pub fn new(config: AppConfig, debug_mode: bool) -> Self {
        let extractor = match PdfTextExtractor::locate() {
            Ok(e) => Extractor::Pdf(e),
            Err(e) => {
                tracing::warn!(error = %e, "PDF ingestion disabled");
                Extractor::Unavailable
            }
        };
        let ledger = AnnotationLedger::with_default_labels(config.label_delimiter);
        let mut state = Self {
            config,
            store: DocumentStore::new(),
            ledger,
            selected_doc: None,
            draft: SpanDraft::default(),
            relation_draft: RelationDraft::default(),
            search: SearchState::default(),
            paste_input: String::new(),
            show_paste_dialog: false,
            status_message: "Ready. Load documents to begin annotating.".to_string(),
            warnings: Vec::new(),
            show_warnings: false,
            last_summary: None,
            debug_mode,
            extractor,
        };
        if matches!(state.extractor, Extractor::Unavailable) {
            state.push_warning(
                "pdftotext was not found on PATH; .pdf files will be skipped. \
                 Install poppler-utils to enable PDF ingestion."
                    .to_string(),
            );
        }
        state
    }

    fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            csv_id_column: self.config.csv_id_column.clone(),
            csv_text_column: self.config.csv_text_column.clone(),
            max_file_size: constants::MAX_SOURCE_FILE_SIZE,
        }
    }

    fn folder_config(&self) -> FolderConfig {
        FolderConfig {
            max_depth: self.config.max_depth,
            max_files: self.config.max_files,
            ..Default::default()
        }
    }

    // -------------------------------------------------------------------------
    // Status and warnings
    // -------------------------------------------------------------------------

    /// Set the status bar message.
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Record a non-fatal warning, capped so a pathological run cannot grow
    /// the list without bound.
    pub fn push_warning(&mut self, msg: String) {
        if self.warnings.len() < constants::MAX_WARNINGS {
            self.warnings.push(msg);
        }
    }

    fn absorb_warnings(&mut self, warnings: Vec<String>) {
        for w in warnings {
            self.push_warning(w);
        }
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// The document open in the viewer, if any.
    pub fn selected_document(&self) -> Option<&Document> {
        self.selected_doc
            .as_deref()
            .and_then(|id| self.store.get(id).ok())
    }

    /// Open a document in the viewer and reset the span draft.
    pub fn select_document(&mut self, id: &str) {
        if self.store.contains(id) {
            self.selected_doc = Some(id.to_string());
            self.draft.clear_span();
        }
    }

    /// Remove the selected document and every annotation on it.
    pub fn remove_selected_document(&mut self) {
        let Some(id) = self.selected_doc.take() else {
            return;
        };
        let dropped = self.ledger.remove_document_annotations(&id);
        match self.store.remove(&id) {
            Ok(doc) => {
                self.set_status(format!(
                    "Removed document '{}' and {dropped} annotation(s).",
                    doc.id
                ));
            }
            Err(e) => self.set_status(format!("Remove failed: {e}")),
        }
        // Stale search hits would point at the removed document.
        self.search.results = SearchResults::default();
        self.search.current = None;
    }

    // -------------------------------------------------------------------------
    // Ingestion
    // -------------------------------------------------------------------------

    /// Ingest a folder tree, absorbing warnings and the summary.
    pub fn ingest_folder(&mut self, root: &Path) {
        let folder = self.folder_config();
        let config = self.ingest_config();
        let extractor = self.extractor.clone();
        match ingest::ingest_folder(&mut self.store, root, &folder, &config, &extractor) {
            Ok((summary, warnings)) => {
                self.absorb_warnings(warnings);
                self.set_status(format!(
                    "Loaded {} document(s) from {} file(s); {} file(s) skipped.",
                    summary.documents_added, summary.files_loaded, summary.files_skipped
                ));
                self.select_first_if_none();
                self.last_summary = Some(summary);
            }
            Err(e) => self.set_status(format!("Folder ingest failed: {e}")),
        }
    }

    /// Ingest individually chosen files.
    pub fn ingest_files(&mut self, paths: &[std::path::PathBuf]) {
        let config = self.ingest_config();
        let extractor = self.extractor.clone();
        let mut summary = IngestSummary::default();
        let mut warnings = Vec::new();
        for path in paths {
            summary.files_seen += 1;
            match core_ingest::ingest_path(&mut self.store, path, &config, &extractor) {
                Ok(added) => {
                    summary.files_loaded += 1;
                    summary.documents_added += added;
                }
                Err(e) => {
                    summary.files_skipped += 1;
                    warnings.push(format!("{e}"));
                }
            }
        }
        self.absorb_warnings(warnings);
        self.set_status(format!(
            "Loaded {} document(s) from {} file(s); {} file(s) skipped.",
            summary.documents_added, summary.files_loaded, summary.files_skipped
        ));
        self.select_first_if_none();
        self.last_summary = Some(summary);
    }

    /// Ingest the paste-dialog text as one or more documents.
    pub fn ingest_pasted(&mut self) {
        let content = std::mem::take(&mut self.paste_input);
        match core_ingest::ingest_text(&mut self.store, &content, None) {
            Ok(added) => {
                self.set_status(format!("Added {added} document(s) from pasted text."));
                self.select_first_if_none();
                self.show_paste_dialog = false;
            }
            Err(e) => {
                // Give the text back so a slip of the thumb is not destructive.
                self.paste_input = content;
                self.set_status(format!("Paste rejected: {e}"));
            }
        }
    }

    fn select_first_if_none(&mut self) {
        if self.selected_doc.is_none() {
            if let Some(doc) = self.store.documents().next() {
                self.selected_doc = Some(doc.id.clone());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Annotation
    // -------------------------------------------------------------------------

    /// Create an annotation from the current draft on the selected document.
    pub fn add_annotation_from_draft(&mut self) {
        let Some(doc_id) = self.selected_doc.clone() else {
            self.set_status("Select a document before annotating.");
            return;
        };
        let Ok(start) = self.draft.start_input.trim().parse::<usize>() else {
            self.set_status("Span start must be a character offset.");
            return;
        };
        let Ok(end) = self.draft.end_input.trim().parse::<usize>() else {
            self.set_status("Span end must be a character offset.");
            return;
        };
        let labels: Vec<String> = self.draft.selected_labels.iter().cloned().collect();
        // Take just the id so the ledger borrow ends before set_status.
        match self
            .ledger
            .add_annotation(&self.store, &doc_id, start, end, labels)
            .map(|ann| ann.id)
        {
            Ok(id) => {
                self.set_status(format!("Annotation {id} added at [{start}, {end})."));
                self.draft.clear_span();
            }
            Err(e) => self.set_status(format!("Annotation rejected: {e}")),
        }
    }

    /// Remove an annotation by id, along with any relations that touch it.
    pub fn remove_annotation(&mut self, id: u64) {
        match self.ledger.remove_annotation(id) {
            Ok(ann) => self.set_status(format!(
                "Removed annotation {id} from document '{}'.",
                ann.doc_id
            )),
            Err(e) => self.set_status(format!("Remove failed: {e}")),
        }
    }

    /// Create a relation from the current relation draft.
    pub fn add_relation_from_draft(&mut self) {
        let Ok(head) = self.relation_draft.head_input.trim().parse::<u64>() else {
            self.set_status("Relation head must be an annotation id.");
            return;
        };
        let Ok(tail) = self.relation_draft.tail_input.trim().parse::<u64>() else {
            self.set_status("Relation tail must be an annotation id.");
            return;
        };
        let label = {
            let typed = self.relation_draft.label_input.trim();
            if typed.is_empty() {
                constants::DEFAULT_RELATION_LABEL.to_string()
            } else {
                typed.to_string()
            }
        };
        match self
            .ledger
            .add_relation(head, tail, &label)
            .map(|rel| rel.id)
        {
            Ok(id) => {
                self.set_status(format!(
                    "Relation {id} added: {head} -[{label}]-> {tail}."
                ));
                self.relation_draft.clear();
            }
            Err(e) => self.set_status(format!("Relation rejected: {e}")),
        }
    }

    /// Remove a relation by id.
    pub fn remove_relation(&mut self, id: u64) {
        match self.ledger.remove_relation(id) {
            Ok(rel) => self.set_status(format!(
                "Removed relation {id} from document '{}'.",
                rel.doc_id
            )),
            Err(e) => self.set_status(format!("Remove failed: {e}")),
        }
    }

    /// Register the label typed in the new-label field and tick it.
    pub fn add_label_from_draft(&mut self) {
        let name = self.draft.new_label_input.trim().to_string();
        match self.ledger.add_label(&name) {
            Ok(true) => {
                self.set_status(format!("Label '{name}' added."));
                self.draft.selected_labels.insert(name);
                self.draft.new_label_input.clear();
            }
            Ok(false) => {
                self.set_status(format!("Label '{name}' already exists."));
                self.draft.selected_labels.insert(name);
                self.draft.new_label_input.clear();
            }
            Err(e) => self.set_status(format!("Label rejected: {e}")),
        }
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Run the search panel query across all documents.
    pub fn run_search(&mut self) {
        self.search.results = search::find_matches(&self.store, &self.search.query);
        self.search.current = if self.search.results.matches.is_empty() {
            None
        } else {
            Some(0)
        };
        let n = self.search.results.matches.len();
        let suffix = if self.search.results.truncated {
            " (capped)"
        } else {
            ""
        };
        self.set_status(format!("{n} match(es){suffix}."));
        self.focus_current_match();
    }

    /// Step the focused match forward or backward, wrapping.
    pub fn step_match(&mut self, delta: isize) {
        let n = self.search.results.matches.len();
        if n == 0 {
            return;
        }
        let current = self.search.current.unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(n as isize) as usize;
        self.search.current = Some(next);
        self.focus_current_match();
    }

    /// Open the focused match's document and preload its span into the draft.
    fn focus_current_match(&mut self) {
        let Some(idx) = self.search.current else {
            return;
        };
        let Some(m) = self.search.results.matches.get(idx).cloned() else {
            return;
        };
        self.selected_doc = Some(m.doc_id);
        self.draft.start_input = m.start.to_string();
        self.draft.end_input = m.end.to_string();
    }

    /// Annotate the focused search match with the draft's labels.
    pub fn annotate_current_match(&mut self) {
        let Some(idx) = self.search.current else {
            self.set_status("No search match selected.");
            return;
        };
        let Some(m) = self.search.results.matches.get(idx).cloned() else {
            return;
        };
        let labels: Vec<String> = self.draft.selected_labels.iter().cloned().collect();
        match search::annotate_match(&mut self.ledger, &self.store, &m, &labels) {
            Ok(id) => self.set_status(format!("Annotation {id} added from search.")),
            Err(e) => self.set_status(format!("Annotation rejected: {e}")),
        }
    }

    /// Annotate every search match with the draft's labels.
    pub fn annotate_all_matches(&mut self) {
        let labels: Vec<String> = self.draft.selected_labels.iter().cloned().collect();
        let matches = self.search.results.matches.clone();
        match search::annotate_all_matches(&mut self.ledger, &self.store, &matches, &labels) {
            Ok(outcome) => self.set_status(format!(
                "Annotated {} match(es); {} duplicate(s) skipped.",
                outcome.added, outcome.duplicates
            )),
            Err(e) => self.set_status(format!("Bulk annotation failed: {e}")),
        }
    }

    // -------------------------------------------------------------------------
    // Export / import
    // -------------------------------------------------------------------------

    /// Export all annotations to `path`; the format follows the extension
    /// (.csv is CSV, anything else is JSON).
    pub fn export_annotations(&mut self, path: &Path) {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        let file = match std::fs::File::create(path) {
            Ok(f) => f,
            Err(e) => {
                self.set_status(format!("Export failed: cannot create '{}': {e}", path.display()));
                return;
            }
        };
        let writer = std::io::BufWriter::new(file);
        let result = if is_csv {
            export::export_csv(&self.store, &self.ledger, writer, path)
        } else {
            export::export_json(&self.store, &self.ledger, writer, path)
        };
        match result {
            Ok(count) => self.set_status(format!(
                "Exported {count} annotation(s) to '{}'.",
                path.display()
            )),
            Err(e) => self.set_status(format!("Export failed: {e}")),
        }
    }

    /// Import annotations from `path` into the current session. The import
    /// is atomic: a bad file changes nothing.
    pub fn import_annotations(&mut self, path: &Path) {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) => {
                self.set_status(format!("Import failed: cannot read '{}': {e}", path.display()));
                return;
            }
        };
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        let result = if is_csv {
            export::import_csv(&self.store, &mut self.ledger, &data)
        } else {
            export::import_json(&self.store, &mut self.ledger, &data)
        };
        match result {
            Ok(count) => self.set_status(format!(
                "Imported {count} annotation(s) from '{}'.",
                path.display()
            )),
            Err(e) => self.set_status(format!("Import rejected ({e}); nothing was changed.")),
        }
    }

    // -------------------------------------------------------------------------
    // Workspace
    // -------------------------------------------------------------------------

    /// Save the full session (documents + annotations + labels) to `path`.
    pub fn save_workspace(&mut self, path: &Path) {
        let data = WorkspaceData::capture(&self.store, &self.ledger);
        match workspace::save(&data, path) {
            Ok(()) => self.set_status(format!("Workspace saved to '{}'.", path.display())),
            Err(e) => self.set_status(format!("Workspace save failed: {e}")),
        }
    }

    /// Replace the current session with the workspace at `path`.
    pub fn load_workspace(&mut self, path: &Path) {
        let data = match workspace::load(path) {
            Ok(d) => d,
            Err(e) => {
                self.set_status(format!("Workspace load failed: {e}"));
                return;
            }
        };
        match data.into_session() {
            Ok((store, ledger)) => {
                self.store = store;
                self.ledger = ledger;
                self.selected_doc = None;
                self.select_first_if_none();
                self.search = SearchState::default();
                self.draft = SpanDraft::default();
                self.relation_draft = RelationDraft::default();
                self.set_status(format!(
                    "Workspace loaded: {} document(s), {} annotation(s), {} relation(s).",
                    self.store.len(),
                    self.ledger.len(),
                    self.ledger.relations().count()
                ));
            }
            Err(e) => self.set_status(format!("Workspace load failed: {e}")),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_doc() -> AppState {
        let mut state = AppState::new(AppConfig::default(), false);
        state
            .store
            .add_document_with_id("note-1", "Patient has diabetes.")
            .unwrap();
        state.select_document("note-1");
        state
    }

    #[test]
    fn test_draft_annotation_happy_path() {
        let mut state = state_with_doc();
        state.draft.start_input = "12".to_string();
        state.draft.end_input = "20".to_string();
        state.draft.selected_labels.insert("Diagnosis".to_string());

        state.add_annotation_from_draft();
        assert_eq!(state.ledger.len(), 1);
        assert!(state.status_message.contains("Annotation 1 added"));
        // Span fields reset, labels retained for the next span.
        assert!(state.draft.start_input.is_empty());
        assert!(state.draft.selected_labels.contains("Diagnosis"));
    }

    #[test]
    fn test_draft_annotation_bad_offset_sets_status() {
        let mut state = state_with_doc();
        state.draft.start_input = "twelve".to_string();
        state.draft.end_input = "20".to_string();
        state.draft.selected_labels.insert("Diagnosis".to_string());

        state.add_annotation_from_draft();
        assert!(state.ledger.is_empty());
        assert!(state.status_message.contains("start"));
    }

    #[test]
    fn test_remove_selected_document_drops_annotations() {
        let mut state = state_with_doc();
        state
            .ledger
            .add_annotation(&state.store, "note-1", 12, 20, ["Diagnosis"])
            .unwrap();

        state.remove_selected_document();
        assert!(state.store.is_empty());
        assert!(state.ledger.is_empty());
        assert!(state.selected_doc.is_none());
    }

    #[test]
    fn test_search_focus_preloads_draft() {
        let mut state = state_with_doc();
        state.search.query = "diabetes".to_string();
        state.run_search();

        assert_eq!(state.search.results.matches.len(), 1);
        assert_eq!(state.draft.start_input, "12");
        assert_eq!(state.draft.end_input, "20");
    }

    #[test]
    fn test_step_match_wraps() {
        let mut state = AppState::new(AppConfig::default(), false);
        state
            .store
            .add_document_with_id("d1", "aspirin then aspirin")
            .unwrap();
        state.search.query = "aspirin".to_string();
        state.run_search();
        assert_eq!(state.search.current, Some(0));

        state.step_match(1);
        assert_eq!(state.search.current, Some(1));
        state.step_match(1);
        assert_eq!(state.search.current, Some(0));
        state.step_match(-1);
        assert_eq!(state.search.current, Some(1));
    }

    fn state_with_two_annotations() -> AppState {
        let mut state = state_with_doc();
        state
            .ledger
            .add_annotation(&state.store, "note-1", 0, 7, ["Symptom"])
            .unwrap();
        state
            .ledger
            .add_annotation(&state.store, "note-1", 12, 20, ["Diagnosis"])
            .unwrap();
        state
    }

    #[test]
    fn test_draft_relation_happy_path() {
        let mut state = state_with_two_annotations();
        state.relation_draft.head_input = "1".to_string();
        state.relation_draft.tail_input = "2".to_string();

        state.add_relation_from_draft();
        assert_eq!(state.ledger.relations().count(), 1);
        // Blank label falls back to the default.
        let rel = state.ledger.relations().next().unwrap();
        assert_eq!(rel.label, constants::DEFAULT_RELATION_LABEL);
        assert!(state.status_message.contains("Relation 1 added"));
        assert!(state.relation_draft.head_input.is_empty());
    }

    #[test]
    fn test_draft_relation_bad_id_sets_status() {
        let mut state = state_with_two_annotations();
        state.relation_draft.head_input = "one".to_string();
        state.relation_draft.tail_input = "2".to_string();

        state.add_relation_from_draft();
        assert_eq!(state.ledger.relations().count(), 0);
        assert!(state.status_message.contains("head"));
    }

    #[test]
    fn test_remove_annotation_reports_and_cascades() {
        let mut state = state_with_two_annotations();
        state.relation_draft.head_input = "1".to_string();
        state.relation_draft.tail_input = "2".to_string();
        state.relation_draft.label_input = "treats".to_string();
        state.add_relation_from_draft();
        assert_eq!(state.ledger.relations().count(), 1);

        state.remove_annotation(2);
        assert_eq!(state.ledger.len(), 1);
        assert_eq!(state.ledger.relations().count(), 0);
    }

    #[test]
    fn test_remove_relation_keeps_spans() {
        let mut state = state_with_two_annotations();
        state.relation_draft.head_input = "2".to_string();
        state.relation_draft.tail_input = "1".to_string();
        state.add_relation_from_draft();

        state.remove_relation(1);
        assert_eq!(state.ledger.relations().count(), 0);
        assert_eq!(state.ledger.len(), 2);
        assert!(state.status_message.contains("Removed relation 1"));
    }

    #[test]
    fn test_pasted_text_survives_rejection() {
        let mut state = AppState::new(AppConfig::default(), false);
        state.paste_input = "   ".to_string();
        state.ingest_pasted();
        assert_eq!(state.paste_input, "   ");
        assert!(state.status_message.contains("rejected"));
    }
}
