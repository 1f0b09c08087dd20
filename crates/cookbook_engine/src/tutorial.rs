use cookbook_core::{build_prompt, TemplateRecord, SYSTEM_PROMPT};
use cookbook_logging::cookbook_debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::decode_body;
use crate::retry::{FetchFailure, RetryingFetcher};
use crate::settings::LlmSettings;
use crate::FetchRequest;

#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error("completion request failed: {0}")]
    Request(#[from] FetchFailure),
    #[error("unreadable completion response: {0}")]
    Response(String),
    #[error("completion was empty")]
    Empty,
    #[error("could not write tutorial: {0}")]
    Write(String),
}

/// Produces tutorial text for one template.
#[async_trait::async_trait]
pub trait TutorialWriter: Send + Sync {
    async fn write(&self, record: &TemplateRecord) -> Result<String, GenerationFailure>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiTutorialWriter {
    fetcher: RetryingFetcher,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiTutorialWriter {
    pub fn new(fetcher: RetryingFetcher, api_key: impl Into<String>, settings: &LlmSettings) -> Self {
        Self {
            fetcher,
            api_key: api_key.into(),
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }
}

#[async_trait::async_trait]
impl TutorialWriter for OpenAiTutorialWriter {
    async fn write(&self, record: &TemplateRecord) -> Result<String, GenerationFailure> {
        let prompt = build_prompt(record);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let json = serde_json::to_string(&body)
            .map_err(|err| GenerationFailure::Response(err.to_string()))?;
        let request = FetchRequest::post_json(&self.endpoint, json)
            .header("Authorization", format!("Bearer {}", self.api_key));

        let response = self.fetcher.fetch(&request).await?;
        let text = decode_body(&response.body, response.content_type.as_deref())
            .map_err(|err| GenerationFailure::Response(err.to_string()))?;
        let content = parse_completion(&text)?;
        cookbook_debug!("completion for {} has {} chars", record.id, content.len());
        Ok(content)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completions body.
pub fn parse_completion(body: &str) -> Result<String, GenerationFailure> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|err| GenerationFailure::Response(err.to_string()))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();
    if content.is_empty() {
        return Err(GenerationFailure::Empty);
    }
    Ok(content)
}
