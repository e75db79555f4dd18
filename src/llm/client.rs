use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ports::{CompletionRequest, LanguageModel, Transcriber};
use crate::config::{OpenAiConfig, Secret};
use crate::error::{GradingError, UpstreamError};
use crate::models::Upload;

const SERVICE: &str = "OpenAI";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI-compatible chat completion and transcription client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: Secret,
    model: String,
    transcription_model: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create OpenAI HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            transcription_model: config.transcription_model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, UpstreamError> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .send()
            .await
            .map_err(UpstreamError::transport(SERVICE))?;
        UpstreamError::check(SERVICE, response).await
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GradingError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json.then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!(model = %self.model, prompt_len = request.prompt.len(), "Sending chat completion");
        let response: ChatResponse = self
            .send(self.client.post(&url).json(&body))
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::Decode {
                service: SERVICE,
                detail: e.to_string(),
            })?;

        // Parse choices[0].message.content
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| GradingError::Parse("OpenAI response missing content".into()))?;

        Ok(text)
    }
}

#[async_trait]
impl Transcriber for OpenAiClient {
    async fn transcribe(&self, upload: &Upload) -> Result<String, GradingError> {
        let url = format!("{}/audio/transcriptions", self.base_url);

        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .text("response_format", "json")
            .part("file", upload_part(upload));

        debug!(bytes = upload.len(), "Sending transcription request");
        let response: TranscriptionResponse = self
            .send(self.client.post(&url).multipart(form))
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::Decode {
                service: SERVICE,
                detail: e.to_string(),
            })?;

        Ok(response.text.trim().to_string())
    }
}

/// File part for the transcription form
///
/// The endpoint infers the container format from the file extension, so an
/// unusable declared content type is dropped rather than failing the call.
fn upload_part(upload: &Upload) -> Part {
    let file_name = upload
        .file_name
        .clone()
        .unwrap_or_else(|| "presentation.mp4".to_string());
    let part = || Part::bytes(upload.bytes.clone()).file_name(file_name.clone());

    match &upload.content_type {
        Some(content_type) => part().mime_str(content_type).unwrap_or_else(|e| {
            warn!(content_type = %content_type, "Ignoring invalid upload content type: {}", e);
            part()
        }),
        None => part(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiClient {
        let config = OpenAiConfig {
            api_key: Secret::new("sk-test"),
            base_url: server.uri(),
            model: "gpt-4o".into(),
            transcription_model: "whisper-1".into(),
        };
        OpenAiClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    fn chat_reply(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
    }

    #[tokio::test]
    async fn test_complete_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "response_format": { "type": "json_object" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("  {\"ok\": true}\n")))
            .mount(&server)
            .await;

        let text = client_for(&server)
            .complete(CompletionRequest::new("Reply in JSON").with_system("You grade").expect_json())
            .await
            .unwrap();
        assert_eq!(text, "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_empty_choices_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(CompletionRequest::new("hello"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_invalid_key_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(CompletionRequest::new("hello"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_AUTH_ERROR");
    }

    #[tokio::test]
    async fn test_transcribe_posts_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": " We build widgets. " })),
            )
            .mount(&server)
            .await;

        let upload = Upload::new(Some("pitch.mp4".into()), Some("video/mp4".into()), vec![0u8; 64]);
        let text = client_for(&server).transcribe(&upload).await.unwrap();
        assert_eq!(text, "We build widgets.");
    }

    #[tokio::test]
    async fn test_transcribe_ignores_invalid_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "text": "Hello" })))
            .expect(1)
            .mount(&server)
            .await;

        let upload = Upload::new(Some("pitch.mp4".into()), Some("not a mime".into()), vec![0u8; 64]);
        let text = client_for(&server).transcribe(&upload).await.unwrap();
        assert_eq!(text, "Hello");
    }
}
