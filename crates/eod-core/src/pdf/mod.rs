//! PDF text loading using pdf-extract.

use tracing::debug;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Extract the linear text of a PDF held in memory.
pub fn extract_text(data: &[u8]) -> Result<String> {
    let text = pdf_extract::extract_text_from_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(PdfError::Empty);
    }

    debug!("Extracted {} characters from {} byte PDF", text.len(), data.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_parse_error() {
        let err = extract_text(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }
}
