//! File intake: type validation and text extraction
//!
//! Validation happens before any backend call. A rejected file never
//! reaches `ReviewBackend::analyze`.

use crate::backend::{ReviewError, UNSUPPORTED_FILE_MESSAGE};
use std::path::Path;
use tracing::debug;

const MIME_PDF: &str = "application/pdf";
const MIME_TEXT: &str = "text/plain";
const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Accepted upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    PlainText,
    Docx,
}

impl FileKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Pdf => MIME_PDF,
            FileKind::PlainText => MIME_TEXT,
            FileKind::Docx => MIME_DOCX,
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            MIME_PDF => Some(FileKind::Pdf),
            MIME_TEXT => Some(FileKind::PlainText),
            MIME_DOCX => Some(FileKind::Docx),
            _ => None,
        }
    }

    fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "txt" => Some(FileKind::PlainText),
            "docx" => Some(FileKind::Docx),
            _ => None,
        }
    }
}

/// Classify an upload by MIME type, falling back to the file extension.
pub fn detect_kind(file_name: &str, mime_type: Option<&str>) -> Result<FileKind, ReviewError> {
    mime_type
        .and_then(FileKind::from_mime)
        .or_else(|| FileKind::from_file_name(file_name))
        .ok_or_else(|| {
            ReviewError::UnsupportedFileType(format!(
                "{} ({})",
                file_name,
                mime_type.unwrap_or("unknown type")
            ))
        })
}

/// A validated upload with its extracted text
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub kind: FileKind,
    pub text: String,
}

/// Extract plain text from file contents.
///
/// DOCX passes validation but has no extractor; it fails the same way an
/// unreadable PDF does.
pub fn extract_text(kind: FileKind, bytes: &[u8]) -> Result<String, ReviewError> {
    let text = match kind {
        FileKind::PlainText => {
            let text = String::from_utf8_lossy(bytes);
            text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
        }
        FileKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ReviewError::AnalysisFailed(format!("could not read PDF: {}", e)))?,
        FileKind::Docx => {
            return Err(ReviewError::AnalysisFailed(
                "text extraction from DOCX is not available; convert to PDF or TXT".to_string(),
            ))
        }
    };

    if text.trim().is_empty() {
        return Err(ReviewError::AnalysisFailed(
            "no text could be extracted from the file".to_string(),
        ));
    }
    Ok(text)
}

/// Validate and extract an in-memory upload.
pub fn load_bytes(
    file_name: &str,
    mime_type: Option<&str>,
    bytes: &[u8],
) -> Result<Document, ReviewError> {
    let kind = detect_kind(file_name, mime_type)?;
    let text = extract_text(kind, bytes)?;
    debug!(file_name, ?kind, chars = text.chars().count(), "document loaded");
    Ok(Document {
        file_name: file_name.to_string(),
        kind,
        text,
    })
}

/// Validate and extract a file on disk. The type is checked before reading.
pub fn load_path(path: &Path) -> Result<Document, ReviewError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    detect_kind(&file_name, None)?;

    let bytes = std::fs::read(path).map_err(|e| {
        ReviewError::AnalysisFailed(format!("cannot read '{}': {}", path.display(), e))
    })?;
    load_bytes(&file_name, None, &bytes)
}

/// Inline message for a rejected upload, or `None` if the error is not about file type.
pub fn rejection_message(err: &ReviewError) -> Option<&'static str> {
    match err {
        ReviewError::UnsupportedFileType(_) => Some(UNSUPPORTED_FILE_MESSAGE),
        _ => None,
    }
}
