//! Free-text backfill for fix handlers.
//!
//! Handlers ask [`Backfill::generate`] for a description, summary or identifier. The adapter
//! never fails: any error from the underlying [`TextGenerator`] (or an empty reply) degrades to
//! [`FALLBACK_TEXT`], and the caller can tell the two apart through [`Generated`].

pub mod client;

use crate::settings::BackfillSettings;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub use client::ChatClient;

/// System message sent with every backfill request.
pub const SYSTEM_PROMPT: &str = "You are an assistant that generates API content.";

/// Text used whenever generation is unavailable or fails.
pub const FALLBACK_TEXT: &str = "This is a fallback placeholder.";

#[derive(Error, Debug)]
pub enum BackfillError {
    #[error("text generation is disabled (no API key configured)")]
    Disabled,

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("text generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected reply from text generation service: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A chat-style text generation capability.
pub trait TextGenerator {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, BackfillError>;
}

/// Outcome of a backfill request. Both variants carry text that is safe to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Generated(String),
    Fallback { text: String, reason: String },
}

impl Generated {
    pub fn text(&self) -> &str {
        match self {
            Generated::Generated(text) | Generated::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Generated::Generated(text) | Generated::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Generated::Fallback { .. })
    }

    fn fallback(reason: impl Into<String>) -> Self {
        Generated::Fallback {
            text: FALLBACK_TEXT.to_string(),
            reason: reason.into(),
        }
    }
}

pub struct Backfill {
    generator: Option<Box<dyn TextGenerator>>,
}

impl Backfill {
    pub fn new(generator: impl TextGenerator + 'static) -> Self {
        Self {
            generator: Some(Box::new(generator)),
        }
    }

    /// An adapter that always answers with the fallback text.
    pub fn disabled() -> Self {
        Self { generator: None }
    }

    /// Build the adapter from settings. Without a usable API key every request degrades to
    /// fallback text.
    pub fn from_settings(settings: &BackfillSettings) -> Self {
        if !settings.is_usable() {
            debug!("text backfill disabled");
            return Self::disabled();
        }
        match ChatClient::from_settings(settings) {
            Ok(client) => Self::new(client),
            Err(error) => {
                warn!(%error, "could not build text generation client; using fallback text");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub fn generate(&self, prompt: &str) -> Generated {
        let Some(generator) = &self.generator else {
            return Generated::fallback(BackfillError::Disabled.to_string());
        };

        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        match generator.complete(&messages) {
            Ok(reply) => {
                let reply = reply.trim();
                if reply.is_empty() {
                    warn!(prompt, "text generation returned an empty reply; using fallback text");
                    Generated::fallback("empty reply")
                } else {
                    Generated::Generated(reply.to_string())
                }
            }
            Err(error) => {
                warn!(%error, prompt, "text generation failed; using fallback text");
                Generated::fallback(error.to_string())
            }
        }
    }
}
