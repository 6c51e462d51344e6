//! Document text extraction for uploaded resumes (PDF and DOCX).

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

pub mod docx;
pub mod pdf;

pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
/// Below this many non-whitespace characters a document is treated as image-only.
const MIN_TEXT_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Please upload a PDF or DOCX file")]
    UnsupportedFormat,

    #[error("File size must be less than 10MB (got {size} bytes)")]
    TooLarge { size: usize },

    #[error("The document appears to be empty or image-based. Please upload a text-based document or enter your details manually.")]
    EmptyOrImageOnly,

    #[error("Failed to read the document. It may be corrupted or password-protected ({0})")]
    Corrupted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedDocument {
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data: data.into(),
        }
    }
}

/// Identifies the document by MIME type or, failing that, by file extension.
pub fn detect_kind(file_name: &str, content_type: Option<&str>) -> Option<DocumentKind> {
    let mime = content_type.unwrap_or_default().to_lowercase();
    let name = file_name.to_lowercase();
    if mime.contains("pdf") || name.ends_with(".pdf") {
        Some(DocumentKind::Pdf)
    } else if mime.contains("wordprocessingml") || name.ends_with(".docx") {
        Some(DocumentKind::Docx)
    } else {
        None
    }
}

/// Checks type and size before any parsing happens.
pub fn validate_document(doc: &UploadedDocument) -> Result<DocumentKind, ExtractionError> {
    let kind = detect_kind(&doc.file_name, doc.content_type.as_deref())
        .ok_or(ExtractionError::UnsupportedFormat)?;
    if doc.data.len() > MAX_DOCUMENT_BYTES {
        return Err(ExtractionError::TooLarge {
            size: doc.data.len(),
        });
    }
    Ok(kind)
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, doc: &UploadedDocument) -> Result<String, ExtractionError>;
}

/// Extracts plain text with `pdf-extract` or by reading `word/document.xml`.
/// Parsing runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

#[async_trait]
impl TextExtractor for DocumentExtractor {
    async fn extract(&self, doc: &UploadedDocument) -> Result<String, ExtractionError> {
        let kind = validate_document(doc)?;
        let data = doc.data.clone();
        debug!("Extracting {:?} text from '{}' ({} bytes)", kind, doc.file_name, data.len());

        let text = tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => pdf::extract_pdf_text(&data),
            DocumentKind::Docx => docx::extract_docx_text(&data),
        })
        .await
        .map_err(|e| {
            warn!("Document parser aborted: {}", e);
            ExtractionError::Corrupted("parser aborted".to_string())
        })??;

        ensure_has_text(text)
    }
}

fn ensure_has_text(text: String) -> Result<String, ExtractionError> {
    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < MIN_TEXT_CHARS {
        return Err(ExtractionError::EmptyOrImageOnly);
    }
    Ok(text.trim().to_string())
}
