use async_trait::async_trait;
use std::sync::Arc;

use crate::application::ports::{ContentExtractor, Transcriber};
use crate::error::GradingError;
use crate::models::Upload;
use crate::text::normalize_whitespace;

/// Pitch transcript from a recorded presentation
#[derive(Clone)]
pub struct VideoTranscriptExtractor {
    transcriber: Arc<dyn Transcriber>,
}

impl VideoTranscriptExtractor {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }
}

#[async_trait]
impl ContentExtractor for VideoTranscriptExtractor {
    fn name(&self) -> &'static str {
        "video"
    }

    async fn extract(&self, upload: &Upload) -> Result<Option<String>, GradingError> {
        let transcript = normalize_whitespace(&self.transcriber.transcribe(upload).await?);
        Ok(Some(transcript).filter(|t| !t.is_empty()))
    }
}
