//! Blocking client for OpenAI-compatible `/chat/completions` endpoints.

use super::{BackfillError, ChatMessage, TextGenerator};
use crate::settings::BackfillSettings;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct ChatClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    pub fn from_settings(settings: &BackfillSettings) -> Result<Self, BackfillError> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(BackfillError::Disabled)?;
        let url = format!(
            "{}/chat/completions",
            settings.endpoint.trim_end_matches('/')
        );
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|source| BackfillError::Request {
                url: url.clone(),
                source,
            })?;
        Ok(Self {
            client,
            url,
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: Some(settings.max_tokens),
        })
    }

    /// Drop the completion length limit (rule generation replies are whole catalogs).
    pub fn without_token_limit(mut self) -> Self {
        self.max_tokens = None;
        self
    }
}

impl TextGenerator for ChatClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, BackfillError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!(url = %self.url, model = %self.model, "sending chat completion request");

        let wrap = |source: reqwest::Error| BackfillError::Request {
            url: self.url.clone(),
            source,
        };
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(wrap)?;

        let status = response.status();
        let body = response.text().map_err(wrap)?;
        if !status.is_success() {
            return Err(BackfillError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_reply(&body)
    }
}

/// Extract `choices[0].message.content` from a completion body.
fn parse_reply(body: &str) -> Result<String, BackfillError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|err| BackfillError::Malformed(err.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackfillError::Malformed("reply has no choices".to_string()))?
        .message
        .content
        .ok_or_else(|| BackfillError::Malformed("reply message has no content".to_string()))
}
