//! Chat service for the stock assistant.
//!
//! This service handles the complete flow of:
//! 1. Resolving the conversation (or preparing a new one)
//! 2. Building the stock context and system prompt
//! 3. Calling OpenRouter, walking the fallback model chain
//! 4. Persisting the user and assistant turns once a model answered

use askama::Template;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use dealerdesk_core::{ChatRole, ConversationId, UserId};

use crate::config::OpenRouterConfig;
use crate::db::{ChatRepository, ConversationOverview, InventoryRepository, RepositoryError};
use crate::models::chat::{Conversation, ConversationTurn};
use crate::openrouter::{
    ChatMessage, ChatRequest, CompletionBackend, OpenRouterClient, OpenRouterError, Usage,
};
use crate::services::context::build_context;

/// System prompt template for the stock assistant.
#[derive(Template)]
#[template(path = "chat/system_prompt.txt")]
struct SystemPromptTemplate<'a> {
    context: &'a str,
}

/// Render the system prompt with the stock context injected.
fn render_system_prompt(context: &str) -> String {
    SystemPromptTemplate { context }
        .render()
        .unwrap_or_else(|_| String::from("Eres un asistente de gestión de concesionarios."))
}

/// Sampling temperature for assistant replies.
const TEMPERATURE: f32 = 0.7;

/// Upper bound on completion length.
const MAX_TOKENS: u32 = 2000;

/// History turns sent upstream per request. Older turns are dropped, never
/// summarized.
const MAX_HISTORY_TURNS: usize = 10;

/// Errors that can occur in the chat service.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// OpenRouter API error.
    #[error("OpenRouter API error: {0}")]
    OpenRouter(#[from] OpenRouterError),

    /// Conversation not found, inactive, or owned by another user.
    #[error("conversation not found")]
    ConversationNotFound,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Result of a successful orchestrated completion.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Assistant reply text.
    pub content: String,
    /// Token accounting, when the provider reports it.
    pub usage: Option<Usage>,
    /// Model that produced the reply, after fallbacks.
    pub model: String,
    /// Provider's stop reason.
    pub finish_reason: Option<String>,
}

/// Drives one completion across the configured model chain.
///
/// Models are tried strictly in order, one request each. Rate limits and
/// missing models advance the chain; any other failure aborts immediately.
/// Each call restarts from the primary model: there is no memory of which
/// models failed before.
pub struct ChatOrchestrator<B> {
    backend: B,
    primary_model: String,
    fallback_models: Vec<String>,
}

impl<B: CompletionBackend> ChatOrchestrator<B> {
    /// Create an orchestrator from the OpenRouter configuration.
    #[must_use]
    pub fn new(backend: B, config: &OpenRouterConfig) -> Self {
        Self {
            backend,
            primary_model: config.model.clone(),
            fallback_models: config.fallback_models.clone(),
        }
    }

    fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_model.as_str())
            .chain(self.fallback_models.iter().map(String::as_str))
    }

    /// Ask the assistant for one reply.
    ///
    /// `history` is the full prior conversation; only the most recent
    /// [`MAX_HISTORY_TURNS`] entries go upstream, between the system message
    /// and the new user message.
    ///
    /// # Errors
    ///
    /// Returns the first non-recoverable error, or the last recoverable one
    /// once the model chain is exhausted.
    #[instrument(skip_all)]
    pub async fn send(
        &self,
        user_message: &str,
        history: &[ChatMessage],
        context: &str,
    ) -> Result<ChatOutcome, OpenRouterError> {
        let messages = assemble_messages(user_message, history, context);
        let mut last_error: Option<OpenRouterError> = None;

        for model in self.candidates() {
            let request = ChatRequest {
                model: model.to_string(),
                messages: messages.clone(),
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
                stream: false,
                data_collection: "allow".to_string(),
            };

            match self.backend.complete(request).await {
                Ok(response) => {
                    let choice = response.choices.into_iter().next().ok_or_else(|| {
                        OpenRouterError::Parse(String::from("response carried no choices"))
                    })?;

                    info!(
                        model = %response.model,
                        total_tokens = response.usage.map(|u| u.total_tokens),
                        "Assistant reply received"
                    );

                    return Ok(ChatOutcome {
                        content: choice.message.content,
                        usage: response.usage,
                        model: response.model,
                        finish_reason: choice.finish_reason,
                    });
                }
                Err(err) if err.is_recoverable() => {
                    warn!(model, error = %err, "Model unavailable, trying next");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        // The chain always has at least the primary model, so falling through
        // means every candidate failed recoverably.
        Err(last_error
            .unwrap_or_else(|| OpenRouterError::Parse(String::from("empty model chain"))))
    }
}

/// Build the outbound message list: system prompt, recent history, new turn.
fn assemble_messages(
    user_message: &str,
    history: &[ChatMessage],
    context: &str,
) -> Vec<ChatMessage> {
    let skipped = history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut messages = Vec::with_capacity(history.len().min(MAX_HISTORY_TURNS) + 2);

    messages.push(ChatMessage::system(render_system_prompt(context)));
    messages.extend(history.iter().skip(skipped).cloned());
    messages.push(ChatMessage::user(user_message));

    messages
}

// =============================================================================
// Service
// =============================================================================

/// Everything persisted by a successful send.
#[derive(Debug)]
pub struct SendOutcome {
    /// The conversation the turns belong to (created if none was given).
    pub conversation: Conversation,
    /// The persisted user turn.
    pub user_turn: ConversationTurn,
    /// The persisted assistant turn, with token and model metadata.
    pub assistant_turn: ConversationTurn,
}

/// Chat service coordinating conversations, context, and the orchestrator.
pub struct ChatService<'a> {
    pool: &'a PgPool,
    orchestrator: &'a ChatOrchestrator<OpenRouterClient>,
}

impl<'a> ChatService<'a> {
    /// Create a new chat service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        orchestrator: &'a ChatOrchestrator<OpenRouterClient>,
    ) -> Self {
        Self { pool, orchestrator }
    }

    /// Send a message and get the assistant's reply.
    ///
    /// Nothing is persisted until a model answers: a failed upstream call
    /// leaves no conversation and no turns behind. On success the
    /// conversation is created when needed (titled from the first message),
    /// then the user turn and the assistant turn are appended.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ConversationNotFound` for an unknown, inactive,
    /// or foreign `conversation_id`; otherwise propagates store and
    /// upstream errors.
    #[instrument(skip(self, message), fields(user_id = %user_id))]
    pub async fn send_message(
        &self,
        user_id: UserId,
        conversation_id: Option<ConversationId>,
        message: &str,
    ) -> Result<SendOutcome, ChatError> {
        let repo = ChatRepository::new(self.pool);

        // Resolve the conversation first so an unknown id fails before any
        // upstream call.
        let existing = match conversation_id {
            Some(id) => Some(
                repo.get_conversation(id, user_id)
                    .await?
                    .ok_or(ChatError::ConversationNotFound)?,
            ),
            None => None,
        };

        let history = match &existing {
            Some(conversation) => repo
                .list_turns(conversation.id)
                .await?
                .iter()
                .map(to_chat_message)
                .collect(),
            None => Vec::new(),
        };

        let context = build_context(&InventoryRepository::new(self.pool)).await?;
        let outcome = self.orchestrator.send(message, &history, &context).await?;

        let conversation = match existing {
            Some(conversation) => conversation,
            None => {
                repo.create_conversation(user_id, &generate_title(message))
                    .await?
            }
        };

        let user_turn = repo
            .add_turn(conversation.id, ChatRole::User, message, None, None)
            .await?;

        let tokens_used = outcome
            .usage
            .map(|usage| i32::try_from(usage.total_tokens).unwrap_or(i32::MAX));
        let assistant_turn = repo
            .add_turn(
                conversation.id,
                ChatRole::Assistant,
                &outcome.content,
                tokens_used,
                Some(&outcome.model),
            )
            .await?;

        Ok(SendOutcome {
            conversation,
            user_turn,
            assistant_turn,
        })
    }

    /// List the user's active conversations, newest activity first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationOverview>, ChatError> {
        let repo = ChatRepository::new(self.pool);
        Ok(repo.list_conversations(user_id).await?)
    }

    /// Get one conversation with all of its turns.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ConversationNotFound` if the conversation does
    /// not exist, is inactive, or belongs to another user.
    pub async fn get_conversation(
        &self,
        user_id: UserId,
        id: ConversationId,
    ) -> Result<(Conversation, Vec<ConversationTurn>), ChatError> {
        let repo = ChatRepository::new(self.pool);

        let conversation = repo
            .get_conversation(id, user_id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;
        let turns = repo.list_turns(conversation.id).await?;

        Ok((conversation, turns))
    }

    /// Soft delete one conversation.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::ConversationNotFound` if there is nothing to
    /// delete for this user.
    pub async fn delete_conversation(
        &self,
        user_id: UserId,
        id: ConversationId,
    ) -> Result<(), ChatError> {
        let repo = ChatRepository::new(self.pool);
        repo.soft_delete(id, user_id)
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound => ChatError::ConversationNotFound,
                other => ChatError::Database(other),
            })
    }

    /// Soft delete all of the user's conversations, returning how many.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn clear_conversations(&self, user_id: UserId) -> Result<u64, ChatError> {
        let repo = ChatRepository::new(self.pool);
        Ok(repo.clear_all(user_id).await?)
    }
}

/// Convert a stored turn to the outbound message format.
fn to_chat_message(turn: &ConversationTurn) -> ChatMessage {
    ChatMessage {
        role: turn.role,
        content: turn.content.clone(),
    }
}

/// Generate a conversation title from the first user message.
fn generate_title(message: &str) -> String {
    const MAX_TITLE_LENGTH: usize = 50;

    let trimmed = message.trim();
    if trimmed.chars().count() <= MAX_TITLE_LENGTH {
        return trimmed.to_string();
    }

    // Cut by characters, not bytes: titles are routinely Spanish text.
    let truncated: String = trimmed.chars().take(MAX_TITLE_LENGTH).collect();
    match truncated.rfind(' ').and_then(|idx| truncated.get(..idx)) {
        Some(head) => format!("{}...", head.trim_end()),
        None => format!("{truncated}..."),
    }
}
