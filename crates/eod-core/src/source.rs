//! Loading report text from files.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::EodError;
use crate::Result;

/// Kind of input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Plain text export.
    Text,
    /// PDF with a text layer.
    Pdf,
}

impl SourceKind {
    /// Detect from the file extension. Unknown extensions are read as text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => SourceKind::Pdf,
            _ => SourceKind::Text,
        }
    }
}

/// Read the linear text of a report file.
pub fn load_text(path: &Path) -> Result<String> {
    let kind = SourceKind::from_path(path);
    info!("Loading {:?} report from {}", kind, path.display());

    match kind {
        SourceKind::Text => Ok(std::fs::read_to_string(path)?),
        SourceKind::Pdf => load_pdf(path),
    }
}

#[cfg(feature = "pdf")]
fn load_pdf(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    Ok(crate::pdf::extract_text(&data)?)
}

#[cfg(not(feature = "pdf"))]
fn load_pdf(path: &Path) -> Result<String> {
    Err(EodError::UnsupportedInput(format!(
        "{} (built without PDF support)",
        path.display()
    )))
}

/// Bytes of a text export, lossily decoded.
pub fn text_from_bytes(data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Err(EodError::UnsupportedInput("empty input".to_string()));
    }
    Ok(String::from_utf8_lossy(data).into_owned())
}
