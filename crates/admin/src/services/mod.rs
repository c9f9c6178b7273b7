//! Business logic services for admin.
//!
//! # Services
//!
//! - `chat` - Conversation flow and OpenRouter orchestration
//! - `context` - Stock context block for the system prompt

pub mod chat;
pub mod context;

pub use chat::{ChatError, ChatOrchestrator, ChatOutcome, ChatService, SendOutcome};
pub use context::{InMemoryInventory, build_context, render_context};
