//! Types for the OpenRouter chat API.
//!
//! These types match the OpenAI-compatible chat completions wire format
//! that OpenRouter exposes.

use serde::{Deserialize, Serialize};

use dealerdesk_core::ChatRole;

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender.
    pub role: ChatRole,
    /// The content of the message.
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for the chat completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model to use (e.g., "openai/gpt-oss-20b").
    pub model: String,
    /// Conversation messages, system prompt first.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Whether to stream the response. Always false here.
    pub stream: bool,
    /// OpenRouter routing hint: allow providers that log prompts, which is
    /// required for most free-tier models.
    pub data_collection: String,
}

/// Response from the chat completions endpoint (non-streaming).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Unique response ID.
    pub id: String,
    /// Model that actually served the request.
    pub model: String,
    /// Generated choices. Exactly one for non-streaming requests.
    pub choices: Vec<Choice>,
    /// Token usage, when the provider reports it.
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One generated completion.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The generated message.
    pub message: ResponseMessage,
    /// Reason generation stopped (e.g., "stop", "length").
    pub finish_reason: Option<String>,
}

/// The message part of a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Role of the generated message (always assistant in practice).
    pub role: ChatRole,
    /// Generated text.
    pub content: String,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens billed.
    pub total_tokens: u32,
}
