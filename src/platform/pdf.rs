// SpanMark - platform/pdf.rs
//
// PDF text extraction by shelling out to poppler's `pdftotext`. Kept in the
// platform layer so the core ingestion code never spawns processes; the core
// sees only the `TextExtractor` trait.

use crate::core::ingest::TextExtractor;
use crate::util::error::ExtractionError;
use std::path::Path;
use std::process::Command;

/// `pdftotext`-backed extractor.
///
/// The binary is located once at construction; a missing binary surfaces as
/// `ExtractionError::MissingBinary` before any file is touched, so the UI
/// can report "install poppler-utils" instead of a per-file failure.
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    binary: std::path::PathBuf,
}

impl PdfTextExtractor {
    /// Locate `pdftotext` on the PATH.
    pub fn locate() -> Result<Self, ExtractionError> {
        let binary = which::which("pdftotext").map_err(|e| ExtractionError::MissingBinary {
            binary: "pdftotext",
            source: e,
        })?;
        tracing::debug!(binary = %binary.display(), "Located pdftotext");
        Ok(Self { binary })
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        // -layout preserves reading order in multi-column reports;
        // "-" sends the text to stdout instead of a sidecar file.
        let output = Command::new(&self.binary)
            .arg("-layout")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| ExtractionError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!("pdftotext exited with {}", output.status)
            } else {
                format!("pdftotext exited with {}: {stderr}", output.status)
            };
            return Err(ExtractionError::Failed {
                path: path.to_path_buf(),
                detail,
            });
        }

        let text = String::from_utf8(output.stdout).map_err(|_| ExtractionError::NonUtf8Output {
            path: path.to_path_buf(),
        })?;

        if text.trim().is_empty() {
            // Scanned image-only PDFs extract to nothing; OCR is out of scope.
            return Err(ExtractionError::Empty {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!(file = %path.display(), chars = text.chars().count(), "Extracted PDF text");
        Ok(text)
    }
}
