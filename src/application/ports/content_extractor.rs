use async_trait::async_trait;

use crate::error::GradingError;
use crate::models::Upload;

/// Turns an uploaded presentation file into reviewable text
///
/// `Ok(None)` means the file held nothing usable; errors are reserved for
/// failures of an upstream service doing the extraction.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, upload: &Upload) -> Result<Option<String>, GradingError>;
}
