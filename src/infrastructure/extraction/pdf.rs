use async_trait::async_trait;
use tracing::{debug, warn};

use crate::application::ports::ContentExtractor;
use crate::error::GradingError;
use crate::models::Upload;
use crate::text::{clip, normalize_whitespace};

pub const MAX_SLIDE_TEXT_BYTES: usize = 24 * 1024;

/// Slide text from a PDF deck
#[derive(Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

/// Normalize extracted text and bound it for the prompt
pub fn clean_slide_text(raw: &str) -> Option<String> {
    let text = normalize_whitespace(raw);
    if text.is_empty() {
        return None;
    }
    Some(clip(&text, MAX_SLIDE_TEXT_BYTES).to_string())
}

#[async_trait]
impl ContentExtractor for PdfTextExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    async fn extract(&self, upload: &Upload) -> Result<Option<String>, GradingError> {
        if !upload.bytes.starts_with(b"%PDF-") {
            warn!(file_name = ?upload.file_name, "Presentation PDF has no PDF header, skipping");
            return Ok(None);
        }

        // The parser is CPU bound and may panic on malformed input
        let bytes = upload.bytes.clone();
        let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;

        match extracted {
            Ok(Ok(raw)) => {
                let text = clean_slide_text(&raw);
                debug!(chars = text.as_ref().map(|t| t.len()).unwrap_or(0), "Extracted slide text");
                Ok(text)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "PDF text extraction failed");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "PDF text extraction aborted");
                Ok(None)
            }
        }
    }
}
