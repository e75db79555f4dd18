use async_trait::async_trait;

use crate::error::GradingError;
use crate::models::Upload;

/// A single-turn chat completion
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    /// Ask the model to answer with a JSON object
    pub json: bool,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            json: false,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn expect_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Trait for language-model completion (OpenAI, compatible gateways, stubs)
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the assistant's reply text, trimmed
    async fn complete(&self, request: CompletionRequest) -> Result<String, GradingError>;
}

/// Trait for speech-to-text over an uploaded audio/video file
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, upload: &Upload) -> Result<String, GradingError>;
}
