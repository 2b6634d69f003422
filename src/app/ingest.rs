// SpanMark - app/ingest.rs
//
// Folder ingestion: recursive traversal of a directory tree, loading every
// supported source file into the document store.
//
// Per-file failures (unsupported format, oversized, unreadable, empty) are
// non-fatal: they are counted as skips and collected as human-readable
// warnings. Only an invalid root is a hard error. Exclude patterns
// short-circuit directory descent via filter_entry, so excluded subtrees
// (e.g. node_modules/) are never traversed at all.

use crate::core::ingest::{self, IngestConfig, TextExtractor};
use crate::core::model::IngestSummary;
use crate::core::store::DocumentStore;
use crate::util::constants;
use crate::util::error::IngestError;
use std::path::Path;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for a folder ingest operation.
#[derive(Debug, Clone)]
pub struct FolderConfig {
    /// Maximum directory recursion depth.
    pub max_depth: usize,

    /// Maximum number of files to ingest before stopping.
    pub max_files: usize,

    /// Glob patterns (filename-only) a file MUST match to be included.
    /// An empty list means "include everything that is not excluded".
    pub include_patterns: Vec<String>,

    /// Glob patterns matched against filenames AND directory component
    /// names. Matching files are skipped; matching directories are not
    /// descended into.
    pub exclude_patterns: Vec<String>,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            max_depth: constants::DEFAULT_MAX_DEPTH,
            max_files: constants::DEFAULT_MAX_FILES,
            include_patterns: constants::DEFAULT_INCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            exclude_patterns: constants::DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

// =============================================================================
// Folder ingestion
// =============================================================================

/// Ingest every supported file under `root`, applying include/exclude glob
/// patterns.
///
/// # Non-fatal errors
/// Files that cannot be ingested are recorded as human-readable strings in
/// the returned warnings vector, counted in `files_skipped`, and do NOT
/// cause the function to return `Err`.
///
/// # Fatal errors
/// Returns `Err` only if the root path is invalid (`RootNotFound`,
/// `NotADirectory`).
pub fn ingest_folder(
    store: &mut DocumentStore,
    root: &Path,
    folder: &FolderConfig,
    config: &IngestConfig,
    extractor: &dyn TextExtractor,
) -> Result<(IngestSummary, Vec<String>), IngestError> {
    // Pre-flight validation.
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(IngestError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(IngestError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    // Clamp config limits to absolute bounds.
    let max_files = folder.max_files.min(constants::ABSOLUTE_MAX_FILES);
    let max_depth = folder.max_depth.min(constants::ABSOLUTE_MAX_DEPTH);

    tracing::debug!(
        root = %root.display(),
        max_depth,
        max_files,
        include = ?folder.include_patterns,
        exclude = ?folder.exclude_patterns,
        "Folder ingest starting"
    );

    // Compile glob patterns once; log and skip any that fail compilation.
    let include_pats = compile_patterns(&folder.include_patterns, "include");
    let exclude_pats = compile_patterns(&folder.exclude_patterns, "exclude");

    let mut summary = IngestSummary::default();
    let mut warnings: Vec<String> = Vec::new();
    let mut limit_hit = false;

    // Sorted traversal so document ids are assigned in a stable order
    // regardless of filesystem enumeration order.
    let walker = walkdir::WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // For directories: skip if the directory's own name matches a
            // literal (wildcard-free) exclude pattern. Wildcard patterns
            // are only tested against filenames.
            if e.file_type().is_dir() {
                let name = e.file_name().to_str().unwrap_or("");
                if e.depth() == 0 {
                    return true;
                }
                return !is_excluded_component(name, &exclude_pats);
            }
            true
        });

    for entry_result in walker {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let path_str = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<unknown>".to_string());
                let msg = format!("Cannot access '{path_str}': {e}");
                tracing::debug!(warning = %msg, "Folder ingest warning");
                push_warning(&mut warnings, msg);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();

        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => {
                push_warning(
                    &mut warnings,
                    format!("Skipping '{}': non-UTF-8 filename", path.display()),
                );
                continue;
            }
        };

        if is_excluded_filename(file_name, &exclude_pats) {
            tracing::trace!(file = file_name, "Excluded by pattern");
            continue;
        }
        if !is_included(file_name, &include_pats) {
            tracing::trace!(file = file_name, "Not matched by include patterns");
            continue;
        }

        if summary.files_seen >= max_files {
            limit_hit = true;
            break;
        }
        summary.files_seen += 1;

        match ingest::ingest_path(store, path, config, extractor) {
            Ok(added) => {
                summary.files_loaded += 1;
                summary.documents_added += added;
            }
            Err(e) => {
                summary.files_skipped += 1;
                push_warning(&mut warnings, format!("{e}"));
            }
        }
    }

    if limit_hit {
        push_warning(
            &mut warnings,
            format!(
                "The folder contains more matching files than the ingest limit \
                 of {max_files}. Remaining files were not loaded; raise the \
                 limit in config.toml if you need more."
            ),
        );
    }

    tracing::info!(
        files_seen = summary.files_seen,
        files_loaded = summary.files_loaded,
        files_skipped = summary.files_skipped,
        documents_added = summary.documents_added,
        warnings = warnings.len(),
        "Folder ingest complete"
    );

    Ok((summary, warnings))
}

/// Append a warning, capping the list so a pathological tree cannot grow it
/// without bound.
fn push_warning(warnings: &mut Vec<String>, msg: String) {
    if warnings.len() < constants::MAX_WARNINGS {
        warnings.push(msg);
    }
}

// =============================================================================
// Glob helpers
// =============================================================================

/// Compile a list of glob pattern strings into `glob::Pattern` objects.
/// Patterns that fail to compile are logged as warnings and skipped.
fn compile_patterns(patterns: &[String], kind: &str) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, kind, error = %e, "Invalid glob pattern, skipping");
                None
            }
        })
        .collect()
}

/// True if `dir_name` matches any exclude pattern with no wildcard
/// characters. Literal patterns act as directory component exclusions
/// (e.g. "node_modules", ".git") rather than filename globs.
fn is_excluded_component(dir_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| {
        let s = p.as_str();
        !s.contains('*') && !s.contains('?') && !s.contains('[') && p.matches(dir_name)
    })
}

/// True if `file_name` matches any exclude pattern (wildcard or literal).
fn is_excluded_filename(file_name: &str, exclude_pats: &[glob::Pattern]) -> bool {
    exclude_pats.iter().any(|p| p.matches(file_name))
}

/// True if `file_name` matches at least one include pattern.
/// An empty include list means "include all".
fn is_included(file_name: &str, include_pats: &[glob::Pattern]) -> bool {
    if include_pats.is_empty() {
        return true;
    }
    include_pats.iter().any(|p| p.matches(file_name))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::error::ExtractionError;
    use std::fs;
    use tempfile::TempDir;

    fn stub_extractor(_: &Path) -> Result<String, ExtractionError> {
        Ok("Extracted PDF text.".to_string())
    }

    fn make_temp_tree() -> TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();

        fs::write(root.join("a_note.txt"), "Patient stable.\n").expect("write a_note.txt");
        fs::write(
            root.join("b_notes.csv"),
            "id,text\nn1,First note.\nn2,Second note.\n",
        )
        .expect("write b_notes.csv");
        fs::write(root.join("image.png"), b"\x89PNG").expect("write image.png");

        let sub = root.join("subdir");
        fs::create_dir(&sub).expect("mkdir subdir");
        fs::write(sub.join("nested.txt"), "Nested note.\n").expect("write nested.txt");

        let node = root.join("node_modules");
        fs::create_dir(&node).expect("mkdir node_modules");
        fs::write(node.join("module.txt"), "should be excluded\n").expect("write module.txt");

        dir
    }

    #[test]
    fn test_ingests_supported_files_and_skips_the_rest() {
        let dir = make_temp_tree();
        let mut store = DocumentStore::new();
        let (summary, warnings) = ingest_folder(
            &mut store,
            dir.path(),
            &FolderConfig::default(),
            &IngestConfig::default(),
            &stub_extractor,
        )
        .unwrap();

        // a_note.txt (1 doc), b_notes.csv (2 docs), subdir/nested.txt (1 doc).
        // image.png is filtered out by the include patterns, not skipped.
        // node_modules/ is never descended into.
        assert_eq!(summary.files_seen, 3);
        assert_eq!(summary.files_loaded, 3);
        assert_eq!(summary.files_skipped, 0);
        assert_eq!(summary.documents_added, 4);
        assert_eq!(store.len(), 4);
        assert!(store.contains("n1"));
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    }

    #[test]
    fn test_unreadable_file_is_warned_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // A .csv missing the text column produces a skip, not an error.
        fs::write(dir.path().join("bad.csv"), "id,body\nn1,hello\n").unwrap();
        fs::write(dir.path().join("good.txt"), "Fine note.").unwrap();

        let mut store = DocumentStore::new();
        let (summary, warnings) = ingest_folder(
            &mut store,
            dir.path(),
            &FolderConfig::default(),
            &IngestConfig::default(),
            &stub_extractor,
        )
        .unwrap();
        assert_eq!(summary.files_loaded, 1);
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("text"), "warning: {}", warnings[0]);
    }

    #[test]
    fn test_max_files_limit_warns() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("note_{i}.txt")), "A note.").unwrap();
        }
        let folder = FolderConfig {
            max_files: 2,
            ..Default::default()
        };
        let mut store = DocumentStore::new();
        let (summary, warnings) = ingest_folder(
            &mut store,
            dir.path(),
            &folder,
            &IngestConfig::default(),
            &stub_extractor,
        )
        .unwrap();
        assert_eq!(summary.files_seen, 2);
        assert!(!warnings.is_empty(), "a limit warning must be emitted");
    }

    #[test]
    fn test_root_not_found() {
        let mut store = DocumentStore::new();
        let err = ingest_folder(
            &mut store,
            Path::new("/nonexistent/path/spanmark"),
            &FolderConfig::default(),
            &IngestConfig::default(),
            &stub_extractor,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::RootNotFound { .. }));
    }

    #[test]
    fn test_root_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, "content").unwrap();
        let mut store = DocumentStore::new();
        let err = ingest_folder(
            &mut store,
            &file,
            &FolderConfig::default(),
            &IngestConfig::default(),
            &stub_extractor,
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::NotADirectory { .. }));
    }

    #[test]
    fn test_max_depth_one_excludes_subdirs() {
        let dir = make_temp_tree();
        let folder = FolderConfig {
            max_depth: 1,
            ..Default::default()
        };
        let mut store = DocumentStore::new();
        let (summary, _) = ingest_folder(
            &mut store,
            dir.path(),
            &folder,
            &IngestConfig::default(),
            &stub_extractor,
        )
        .unwrap();
        // nested.txt is below depth 1.
        assert_eq!(summary.files_seen, 2);
    }
}
