//! OpenAI-compatible chat-completions client backing the `AiGenerator` port.
//!
//! Any endpoint speaking the `/chat/completions` dialect works; failures
//! surface as `AiError::Unavailable` and the feature degrades.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quill_core::ports::{AiError, AiGenerator};

/// Configuration for the generation endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl OpenAiConfig {
    /// Read configuration from the environment; `None` when no API key is
    /// set, in which case the AI endpoints report service-unavailable.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("AI_API_KEY").ok()?;

        Some(Self {
            api_base: std::env::var("AI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key,
            model: std::env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        })
    }
}

pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    async fn chat(&self, system: &str, user: String) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.7,
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Unavailable(format!(
                "generation endpoint returned {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AiError::InvalidResponse("response carried no content".to_string()))
    }
}

#[async_trait]
impl AiGenerator for OpenAiGenerator {
    async fn summarize(&self, text: &str) -> Result<String, AiError> {
        self.chat(
            "You summarize blog posts. Reply with a two-to-three sentence \
             summary of the post you are given, with no preamble.",
            text.to_string(),
        )
        .await
    }

    async fn generate_draft(
        &self,
        title: &str,
        tone: &str,
        keywords: &[String],
    ) -> Result<String, AiError> {
        let mut prompt = format!("Write a blog post draft titled \"{title}\" in a {tone} tone.");
        if !keywords.is_empty() {
            prompt.push_str(&format!(" Work in these keywords: {}.", keywords.join(", ")));
        }

        self.chat(
            "You draft blog posts in Markdown. Reply with the post body only.",
            prompt,
        )
        .await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
