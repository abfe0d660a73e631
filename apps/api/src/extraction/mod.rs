//! File Text Extractor: turns uploaded reference documents into plain text.
//!
//! Supported: `.txt` (UTF-8, Latin-1 fallback), `.pdf` (pdf-extract), `.docx` (zip + quick-xml).
//! Parsing of binary formats runs inside `tokio::task::spawn_blocking`; a parser
//! panic surfaces as `ExtractionError::Parser` instead of tearing down the request.

mod docx;
mod pdf;

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::models::upload::extension_of;
use crate::models::UploadedFile;

pub use docx::extract_docx;
pub use pdf::extract_pdf;

/// Extensions accepted by the upload handler.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf", "docx"];

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid PDF: {0}")]
    Pdf(String),

    #[error("invalid DOCX: {0}")]
    Docx(String),

    #[error("parser failed: {0}")]
    Parser(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Txt,
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Declared type of a file, taken from its extension.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        match extension_of(filename).as_deref() {
            Some("txt") => Ok(DocumentKind::Txt),
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("docx") => Ok(DocumentKind::Docx),
            Some("doc") => Err(ExtractionError::Unsupported(
                "DOC format (pre-2007 Word) is not supported, please convert to DOCX".to_string(),
            )),
            Some(other) => Err(ExtractionError::Unsupported(format!(".{other}"))),
            None => Err(ExtractionError::Unsupported("missing file extension".to_string())),
        }
    }
}

/// Decodes plain text: valid UTF-8 is returned as-is, anything else is read as Latin-1.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Synchronous extraction from an in-memory buffer.
pub fn extract_bytes(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractionError> {
    match kind {
        DocumentKind::Txt => Ok(decode_text(bytes)),
        DocumentKind::Pdf => extract_pdf(bytes),
        DocumentKind::Docx => extract_docx(bytes),
    }
}

/// Reads `path` and extracts its text according to `kind`.
pub async fn extract_file(path: &Path, kind: DocumentKind) -> Result<String, ExtractionError> {
    let bytes = tokio::fs::read(path).await?;

    if kind == DocumentKind::Txt {
        return Ok(decode_text(&bytes));
    }

    tokio::task::spawn_blocking(move || extract_bytes(&bytes, kind))
        .await
        .map_err(|e| ExtractionError::Parser(e.to_string()))?
}

/// Extracts one stored upload, resolving its kind from the original filename.
pub async fn extract_upload(file: &UploadedFile) -> Result<String, ExtractionError> {
    let kind = DocumentKind::from_filename(&file.filename)?;
    extract_file(&file.path, kind).await
}

/// Concatenates the text of every file in a category, each under a
/// `--- From <filename> ---` header. Unreadable files contribute an inline
/// error marker so one bad file does not block generation.
pub async fn extract_category_text(files: &[UploadedFile], max_chars: Option<usize>) -> String {
    let mut sections = Vec::with_capacity(files.len());
    let mut total_chars = 0usize;

    for file in files {
        let text = match extract_upload(file).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Error extracting text from {}: {e}", file.filename);
                format!("[Error extracting text: {e}]")
            }
        };
        info!("Extracted {} characters from {}", text.chars().count(), file.filename);

        let section = format!("--- From {} ---\n{}", file.filename, text);
        total_chars += section.chars().count();
        sections.push(section);

        if max_chars.is_some_and(|max| total_chars > max) {
            warn!("Extracted text exceeded {max_chars:?} characters, skipping remaining files");
            break;
        }
    }

    let combined = sections.join("\n\n");
    match max_chars {
        Some(max) if combined.chars().count() > max => {
            let mut truncated: String = combined.chars().take(max).collect();
            truncated.push_str("\n\n[Text truncated due to size limits]");
            truncated
        }
        _ => combined,
    }
}
