//! Plain-text extraction from uploaded file bytes.


use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, warn};

use crate::{AssistantError, Result};

/// File types accepted for upload, declared by filename extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Text,
}

impl DocumentType {
    /// Derive the declared type from a filename's extension (case-insensitive)
    #[inline]
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => Ok(Self::Pdf),
            Some("txt") => Ok(Self::Text),
            Some(other) => Err(AssistantError::Validation(format!(
                "Unsupported file type '.{}': only .pdf and .txt are accepted",
                other
            ))),
            None => Err(AssistantError::Validation(format!(
                "File '{}' has no extension: only .pdf and .txt are accepted",
                filename
            ))),
        }
    }
}

impl std::fmt::Display for DocumentType {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => f.write_str("pdf"),
            Self::Text => f.write_str("txt"),
        }
    }
}

/// Extract plain text from `bytes` according to `declared_type`
#[inline]
pub fn extract(bytes: &[u8], declared_type: DocumentType) -> Result<String> {
    match declared_type {
        DocumentType::Pdf => extract_pdf(bytes),
        DocumentType::Text => Ok(decode_text(bytes)),
    }
}

/// Page-by-page PDF extraction with `--- Page N ---` boundary markers.
/// Empty pages still get a marker so page numbers stay aligned.
fn extract_pdf(bytes: &[u8]) -> Result<String> {
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| AssistantError::Extraction("PDF parser crashed on this file".to_string()))?
        .map_err(|e| AssistantError::Extraction(format!("Failed to read PDF: {}", e)))?;

    debug!("Processing PDF with {} pages", pages.len());
    join_pages(&pages)
}

fn join_pages(pages: &[String]) -> Result<String> {
    let mut text = String::new();
    let mut pages_with_text = 0;

    for (i, page_text) in pages.iter().enumerate() {
        let _ = write!(text, "\n--- Page {} ---\n{}\n", i + 1, page_text);
        if page_text.trim().is_empty() {
            debug!("Page {} has no extractable text", i + 1);
        } else {
            pages_with_text += 1;
            debug!("Extracted {} characters from page {}", page_text.len(), i + 1);
        }
    }

    if pages_with_text == 0 {
        warn!("PDF has no extractable text layer across {} pages", pages.len());
        return Err(AssistantError::Extraction(
            "PDF contains no extractable text; it may be scanned or image-based".to_string(),
        ));
    }

    Ok(text.trim().to_string())
}

/// UTF-8 decode, falling back to Latin-1 which maps every byte to a char
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            debug!("Extracted {} characters from TXT file", text.len());
            text.to_string()
        }
        Err(e) => {
            debug!("TXT file is not valid UTF-8 ({}), decoding as Latin-1", e);
            bytes.iter().map(|&byte| char::from(byte)).collect()
        }
    }
}
