//! The chatbot collaborator. Given a query and a rendered user context it
//! returns an answer; how the answer is produced is the upstream's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::AskConfig;

const PERSONA: &str = "\
You are EdenMindBot, an empathetic therapeutic companion within the EdenMind app.

YOUR ROLE:
- Act STRICTLY as a therapist or supportive companion.
- Provide empathetic, non-judgmental, and evidence-based mental health support.
- Answer ONLY questions related to mental health, therapy, emotions, and well-being.
- If a user asks about unrelated topics (coding, math, history, etc.), politely decline and steer the conversation back to their well-being.

GUIDELINES:
- Use the provided user context to personalize your responses (refer to them by name, acknowledge their recent moods).
- Suggest practical coping strategies, mindfulness exercises, or cognitive behavioral techniques.
- Be concise but warm.

APP INTEGRATION & SUGGESTIONS:
- You can suggest specific mini-games available in this app to help them cope:
  1. \"Breathing Game\": For anxiety reduction and relaxation.
  2. \"Distortion Hunter\": To challenge negative thoughts and cognitive distortions.
  3. \"Serenity Tower\": For focus, patience, and stress relief.
- Suggest these games when appropriate (e.g., recommend the Breathing Game if they are anxious).

CONTEXT:
";

#[derive(Debug, Error)]
pub enum AskError {
    #[error("Chat assistant is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Chat assistant request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Chat assistant returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Chat assistant returned no answer")]
    EmptyAnswer,

    #[error("Chat assistant failed: {0}")]
    Other(String),
}

#[async_trait]
pub trait AskService: Send + Sync {
    async fn ask(&self, query: &str, user_context: &str) -> Result<String, AskError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsAskService {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsAskService {
    pub fn new(config: &AskConfig, api_key: String) -> Result<Self, AskError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl AskService for ChatCompletionsAskService {
    async fn ask(&self, query: &str, user_context: &str) -> Result<String, AskError> {
        let system = format!("{}{}", PERSONA, user_context);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: query,
                },
            ],
        };

        debug!("Sending chat completion request to {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Chat completion failed with {}: {}", status, body);
            return Err(AskError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|answer| !answer.trim().is_empty())
            .ok_or(AskError::EmptyAnswer)
    }
}

/// Stand-in when no API key is configured; every call fails.
#[derive(Debug, Default)]
pub struct UnconfiguredAskService;

#[async_trait]
impl AskService for UnconfiguredAskService {
    async fn ask(&self, _query: &str, _user_context: &str) -> Result<String, AskError> {
        Err(AskError::NotConfigured("set ASK_API_KEY to enable chat answers"))
    }
}

/// Pick the upstream client for the given configuration.
pub fn from_config(config: &AskConfig) -> Result<Box<dyn AskService>, AskError> {
    match &config.api_key {
        Some(key) => Ok(Box::new(ChatCompletionsAskService::new(config, key.clone())?)),
        None => Ok(Box::new(UnconfiguredAskService)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_service_always_fails() {
        let err = UnconfiguredAskService.ask("hello", "").await.unwrap_err();
        assert!(matches!(err, AskError::NotConfigured(_)));
        assert!(err.to_string().contains("ASK_API_KEY"));
    }

    #[test]
    fn endpoint_is_joined_without_double_slash() {
        let config = AskConfig {
            api_base: "http://localhost:9999/v1/".to_string(),
            api_key: Some("k".to_string()),
            model: "m".to_string(),
            timeout_secs: 1,
        };
        let service = ChatCompletionsAskService::new(&config, "k".to_string()).unwrap();
        assert_eq!(service.endpoint, "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn response_without_choices_parses() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(parsed.choices.is_empty());
    }
}
