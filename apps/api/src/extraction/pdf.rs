use super::ExtractionError;

/// Extracts the text of every page of a PDF held in memory.
///
/// pdf-extract can panic on malformed input; callers on the async path run
/// this inside `spawn_blocking` so the panic becomes a `JoinError`.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    Ok(text.trim().to_string())
}
