//! OpenRouter chat API integration (OpenAI-compatible wire format).
//!
//! # Features
//!
//! - Non-streaming chat completions via `POST {base_url}/chat/completions`
//! - Typed error classification so callers never match on message substrings
//! - [`CompletionBackend`] seam between the orchestrator and real HTTP,
//!   letting tests script responses per model
//!
//! # Error Classification
//!
//! OpenRouter reports failures both as HTTP status codes and, for some
//! providers, as a 200 response carrying an error envelope. Both paths are
//! folded into [`OpenRouterError`], whose `is_recoverable` method tells the
//! fallback loop whether the next candidate model should be tried.

pub mod client;
pub mod error;
pub mod types;

pub use client::{CompletionBackend, OpenRouterClient};
pub use error::OpenRouterError;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Choice, ResponseMessage, Usage};
