//! Uploaded document to plain text.
//!
//! Plain text is passed through; PDFs are parsed with lopdf on a blocking
//! worker bounded by a timeout. Scanned (image-only) PDFs yield no text.

use std::sync::LazyLock;
use std::time::Duration;

use lopdf::Document as PdfDoc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SourceError;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const PROCESSING_TIMEOUT: Duration = Duration::from_secs(45);
pub const ALLOWED_TYPES: &[&str] = &["application/pdf", "text/plain"];

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    pub chars: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub text: String,
    pub meta: DocumentMeta,
}

/// Normalise line endings and collapse runs of blank lines.
pub fn clean_text(raw: &str) -> String {
    let unix = raw.replace("\r\n", "\n");
    EXCESS_NEWLINES.replace_all(&unix, "\n\n").trim().to_string()
}

/// Media type without parameters, lower-cased (`text/plain; charset=utf-8` → `text/plain`).
fn base_mime(mime: &str) -> String {
    mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

fn pdf_text(bytes: &[u8]) -> Result<(String, usize), SourceError> {
    let doc = PdfDoc::load_mem(bytes).map_err(|e| SourceError::Pdf(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(SourceError::Pdf("document is password-protected".to_string()));
    }
    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

    let mut text = String::new();
    for page in &page_numbers {
        match doc.extract_text(&[*page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => debug!(page, error = %e, "PDF page has no extractable text"),
        }
    }
    Ok((text, page_numbers.len()))
}

pub async fn extract_text(
    bytes: Vec<u8>,
    mime: &str,
    filename: Option<String>,
) -> Result<ExtractedDocument, SourceError> {
    if bytes.len() > MAX_FILE_SIZE {
        return Err(SourceError::TooLarge { size: bytes.len(), max: MAX_FILE_SIZE });
    }

    let mime = base_mime(mime);
    let (raw, pages) = match mime.as_str() {
        "text/plain" => (String::from_utf8_lossy(&bytes).into_owned(), None),
        "application/pdf" => {
            let job = tokio::task::spawn_blocking(move || pdf_text(&bytes));
            let (text, pages) = match tokio::time::timeout(PROCESSING_TIMEOUT, job).await {
                Err(_) => return Err(SourceError::Timeout(PROCESSING_TIMEOUT.as_secs())),
                Ok(Err(join)) => {
                    warn!(error = %join, "PDF worker failed");
                    return Err(SourceError::Pdf("PDF worker failed".to_string()));
                }
                Ok(Ok(parsed)) => parsed?,
            };
            (text, Some(pages))
        }
        other => return Err(SourceError::UnsupportedType(other.to_string())),
    };

    let text = clean_text(&raw);
    if text.is_empty() {
        return Err(SourceError::Empty);
    }

    debug!(chars = text.chars().count(), ?pages, "Document text extracted");
    Ok(ExtractedDocument {
        meta: DocumentMeta { pages, chars: text.chars().count(), filename },
        text,
    })
}
