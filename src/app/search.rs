// SpanMark - app/search.rs
//
// Cross-document text search with annotation quick-add.
//
// Queries are literal, case-insensitive substrings; the query is escaped
// and compiled to a regex so matching is linear in the corpus. Match
// offsets are converted from regex byte positions to character offsets at
// collection time, since everything downstream (ledger, export) speaks
// character offsets.

use crate::core::ledger::AnnotationLedger;
use crate::core::store::DocumentStore;
use crate::util::constants;
use crate::util::error::LedgerError;
use regex::RegexBuilder;

// =============================================================================
// Matches
// =============================================================================

/// One search hit: a character-offset span in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// Document containing the hit.
    pub doc_id: String,

    /// Span start, inclusive, in characters.
    pub start: usize,

    /// Span end, exclusive, in characters.
    pub end: usize,
}

/// Result of one search run.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    /// Matches in document order, then position order.
    pub matches: Vec<SearchMatch>,

    /// True if collection stopped at the match cap.
    pub truncated: bool,
}

/// Find every occurrence of `query` across all loaded documents,
/// case-insensitively. A blank query returns no matches. Collection stops
/// at the match cap so a one-letter query on a large corpus cannot stall
/// the UI.
pub fn find_matches(store: &DocumentStore, query: &str) -> SearchResults {
    let query = query.trim();
    if query.is_empty() {
        return SearchResults::default();
    }

    let regex = match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            // Escaped literals always compile; this arm is unreachable in
            // practice but a search must never panic the UI thread.
            tracing::warn!(error = %e, "Search pattern failed to compile");
            return SearchResults::default();
        }
    };

    let mut results = SearchResults::default();
    'docs: for doc in store.documents() {
        // Running byte->char conversion: matches arrive in ascending byte
        // order, so one forward pass over the text covers them all.
        let mut chars_seen = 0usize;
        let mut byte_cursor = 0usize;
        for m in regex.find_iter(&doc.text) {
            chars_seen += doc.text[byte_cursor..m.start()].chars().count();
            let start = chars_seen;
            chars_seen += doc.text[m.start()..m.end()].chars().count();
            byte_cursor = m.end();

            results.matches.push(SearchMatch {
                doc_id: doc.id.clone(),
                start,
                end: chars_seen,
            });
            if results.matches.len() >= constants::MAX_SEARCH_MATCHES {
                results.truncated = true;
                break 'docs;
            }
        }
    }

    tracing::debug!(
        query_chars = query.chars().count(),
        matches = results.matches.len(),
        truncated = results.truncated,
        "Search complete"
    );
    results
}

// =============================================================================
// Quick-add
// =============================================================================

/// Outcome of annotating a batch of search matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickAddOutcome {
    /// Annotations created.
    pub added: usize,

    /// Matches skipped because an identical annotation already existed.
    pub duplicates: usize,
}

/// Annotate one search match with the given labels.
pub fn annotate_match(
    ledger: &mut AnnotationLedger,
    store: &DocumentStore,
    m: &SearchMatch,
    labels: &[String],
) -> Result<u64, LedgerError> {
    let ann = ledger.add_annotation(store, &m.doc_id, m.start, m.end, labels.iter().cloned())?;
    Ok(ann.id)
}

/// Annotate every match with the given labels.
///
/// Matches that would duplicate an existing annotation are counted and
/// skipped rather than aborting the run; any other validation failure stops
/// and is returned (matches come from the store, so in practice only
/// duplicates occur).
pub fn annotate_all_matches(
    ledger: &mut AnnotationLedger,
    store: &DocumentStore,
    matches: &[SearchMatch],
    labels: &[String],
) -> Result<QuickAddOutcome, LedgerError> {
    let mut outcome = QuickAddOutcome::default();
    for m in matches {
        match annotate_match(ledger, store, m, labels) {
            Ok(_) => outcome.added += 1,
            Err(LedgerError::Duplicate { .. }) => outcome.duplicates += 1,
            Err(e) => return Err(e),
        }
    }
    tracing::debug!(
        added = outcome.added,
        duplicates = outcome.duplicates,
        "Quick-add complete"
    );
    Ok(outcome)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::span_text;

    fn two_doc_store() -> DocumentStore {
        let mut store = DocumentStore::new();
        store
            .add_document_with_id("d1", "Aspirin given. aspirin repeated.")
            .unwrap();
        store
            .add_document_with_id("d2", "No ASPIRIN today.")
            .unwrap();
        store
    }

    #[test]
    fn test_search_is_case_insensitive_across_documents() {
        let store = two_doc_store();
        let results = find_matches(&store, "aspirin");
        assert_eq!(results.matches.len(), 3);
        assert!(!results.truncated);
        for m in &results.matches {
            let text = &store.get(&m.doc_id).unwrap().text;
            assert!(span_text(text, m.start, m.end)
                .unwrap()
                .eq_ignore_ascii_case("aspirin"));
        }
    }

    #[test]
    fn test_search_offsets_are_char_offsets() {
        let mut store = DocumentStore::new();
        store
            .add_document_with_id("d1", "café aspirin café aspirin")
            .unwrap();
        let results = find_matches(&store, "aspirin");
        assert_eq!(results.matches.len(), 2);
        assert_eq!((results.matches[0].start, results.matches[0].end), (5, 12));
        assert_eq!((results.matches[1].start, results.matches[1].end), (18, 25));
    }

    #[test]
    fn test_search_treats_query_as_literal() {
        let mut store = DocumentStore::new();
        store
            .add_document_with_id("d1", "dose 2.5 mg or 285 mg")
            .unwrap();
        // An unescaped '.' would also match "285".
        let results = find_matches(&store, "2.5");
        assert_eq!(results.matches.len(), 1);
    }

    #[test]
    fn test_blank_query_yields_no_matches() {
        let store = two_doc_store();
        assert!(find_matches(&store, "   ").matches.is_empty());
    }

    #[test]
    fn test_quick_add_all_skips_duplicates() {
        let store = two_doc_store();
        let mut ledger = AnnotationLedger::default();
        let labels = vec!["Medication".to_string()];

        let results = find_matches(&store, "aspirin");
        // Pre-annotate the first match so the bulk run sees a duplicate.
        annotate_match(&mut ledger, &store, &results.matches[0], &labels).unwrap();

        let outcome =
            annotate_all_matches(&mut ledger, &store, &results.matches, &labels).unwrap();
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(ledger.len(), 3);
    }
}
