//! PDF text extraction, a thin wrapper over `pdf-extract`.

use std::path::Path;

use tracing::warn;

use crate::error::{DocError, Result};

/// Returns true if the filename has a `.pdf` extension (case-insensitive)
pub fn is_pdf_file(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

/// Extracts text from a PDF held in memory
///
/// The text is trimmed; a document without any extractable text is an error.
pub fn extract_text_from_pdf_mem(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed documents.
    let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| DocError::PdfExtraction("malformed PDF document".into()))?
        .map_err(|e| DocError::PdfExtraction(e.to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(DocError::PdfExtraction("document contains no extractable text".into()));
    }
    Ok(text.to_string())
}

/// Extracts text from PDF bytes on the blocking thread pool
pub async fn extract_text(bytes: Vec<u8>) -> Result<String> {
    tokio::task::spawn_blocking(move || extract_text_from_pdf_mem(&bytes))
        .await
        .map_err(|e| DocError::PdfExtraction(format!("extraction task failed: {}", e)))?
}

/// Reads and extracts a PDF file from disk
pub async fn extract_text_from_file(path: &Path) -> Result<String> {
    if !is_pdf_file(&path.to_string_lossy()) {
        return Err(DocError::validation(format!("not a PDF file: {}", path.display())));
    }
    let bytes = tokio::fs::read(path).await?;
    extract_text(bytes).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "Error extracting text from PDF");
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_pdf_filenames() {
        assert!(is_pdf_file("paper.pdf"));
        assert!(is_pdf_file("PAPER.PDF"));
        assert!(!is_pdf_file("paper.pdf.txt"));
        assert!(!is_pdf_file("notes.md"));
    }

    #[test]
    fn garbage_is_an_extraction_error() {
        let err = extract_text_from_pdf_mem(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, DocError::PdfExtraction(_)));
    }

    #[tokio::test]
    async fn rejects_non_pdf_paths() {
        let err = extract_text_from_file(Path::new("notes.txt")).await.unwrap_err();
        assert!(matches!(err, DocError::Validation(_)));
    }
}
