//! Chat route handlers for the stock assistant.
//!
//! Provides the JSON API the dealership frontend talks to. All routes
//! require a caller identity (see [`RequireUser`]).

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use dealerdesk_core::{ChatRole, ConversationId};

use crate::db::{ConversationOverview, InventoryRepository, InventoryStats};
use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::models::{BrandSummary, ConversationTurn, StockSummary};
use crate::services::ChatService;
use crate::state::AppState;

/// Longest user message accepted by `/api/chat/send`.
const MAX_MESSAGE_CHARS: usize = 2000;

/// Preview length for the newest turn in conversation listings.
const LAST_TURN_PREVIEW_CHARS: usize = 100;

/// Build the chat router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat/send", post(send_message))
        .route("/api/chat/conversations", get(list_conversations))
        .route(
            "/api/chat/conversation/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/chat/clear", post(clear_conversations))
        .route("/api/chat/stock-summary", get(stock_summary))
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to send a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    /// Existing conversation to continue; a new one is created when absent.
    pub conversation_id: Option<i32>,
}

/// Response for a single conversation turn.
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub id: i32,
    pub role: ChatRole,
    pub content: String,
    pub created_at: String,
    pub tokens_used: Option<i32>,
    pub model_used: Option<String>,
}

impl From<ConversationTurn> for TurnResponse {
    fn from(turn: ConversationTurn) -> Self {
        Self {
            id: turn.id.as_i32(),
            role: turn.role,
            content: turn.content,
            created_at: turn.created_at.to_rfc3339(),
            tokens_used: turn.tokens_used,
            model_used: turn.model_used,
        }
    }
}

/// Response for sending a message.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub conversation_id: i32,
    pub user_message: TurnResponse,
    pub assistant_message: TurnResponse,
    pub tokens_used: Option<i32>,
}

/// A conversation as listed in the history sidebar.
#[derive(Debug, Serialize)]
pub struct ConversationListItem {
    pub id: i32,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
    pub turn_count: i64,
    pub last_turn: Option<LastTurnPreview>,
}

/// Preview of the newest turn in a conversation.
#[derive(Debug, Serialize)]
pub struct LastTurnPreview {
    pub content: String,
    pub role: ChatRole,
    pub created_at: String,
}

impl From<ConversationOverview> for ConversationListItem {
    fn from(overview: ConversationOverview) -> Self {
        Self {
            id: overview.id.as_i32(),
            title: overview.title,
            created_at: overview.created_at.to_rfc3339(),
            updated_at: overview.updated_at.to_rfc3339(),
            is_active: overview.is_active,
            turn_count: overview.turn_count,
            last_turn: overview.last_turn.map(|turn| LastTurnPreview {
                content: turn.content.chars().take(LAST_TURN_PREVIEW_CHARS).collect(),
                role: turn.role,
                created_at: turn.created_at.to_rfc3339(),
            }),
        }
    }
}

/// Response for a conversation with all its turns.
#[derive(Debug, Serialize)]
pub struct ConversationDetailResponse {
    pub id: i32,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_active: bool,
    pub turns: Vec<TurnResponse>,
    pub turn_count: usize,
}

/// Acknowledgement body for delete.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Acknowledgement body for clearing the history.
#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub cleared: u64,
}

/// Response for the stock summary endpoint.
#[derive(Debug, Serialize)]
pub struct StockSummaryResponse {
    pub summary: StockSummary,
    pub top_brands: Vec<BrandSummary>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Send a message and get the assistant's reply.
///
/// POST /api/chat/send
async fn send_message(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let message = validate_message(&request.message)?;
    let conversation_id = request.conversation_id.map(ConversationId::new);

    let service = ChatService::new(state.pool(), state.orchestrator());
    let outcome = service
        .send_message(user_id, conversation_id, message)
        .await?;

    let tokens_used = outcome.assistant_turn.tokens_used;
    Ok(Json(SendMessageResponse {
        conversation_id: outcome.conversation.id.as_i32(),
        user_message: outcome.user_turn.into(),
        assistant_message: outcome.assistant_turn.into(),
        tokens_used,
    }))
}

/// List the caller's active conversations, most recently updated first.
///
/// GET /api/chat/conversations
async fn list_conversations(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<Vec<ConversationListItem>>, AppError> {
    let service = ChatService::new(state.pool(), state.orchestrator());
    let overviews = service.list_conversations(user_id).await?;

    Ok(Json(overviews.into_iter().map(Into::into).collect()))
}

/// Get one conversation with all its turns.
///
/// GET /api/chat/conversation/{id}
async fn get_conversation(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<i32>,
) -> Result<Json<ConversationDetailResponse>, AppError> {
    let service = ChatService::new(state.pool(), state.orchestrator());
    let (conversation, turns) = service
        .get_conversation(user_id, ConversationId::new(id))
        .await?;

    Ok(Json(ConversationDetailResponse {
        id: conversation.id.as_i32(),
        title: conversation.title,
        created_at: conversation.created_at.to_rfc3339(),
        updated_at: conversation.updated_at.to_rfc3339(),
        is_active: conversation.is_active,
        turn_count: turns.len(),
        turns: turns.into_iter().map(Into::into).collect(),
    }))
}

/// Soft-delete a conversation.
///
/// DELETE /api/chat/conversation/{id}
async fn delete_conversation(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<i32>,
) -> Result<Json<DeleteResponse>, AppError> {
    let service = ChatService::new(state.pool(), state.orchestrator());
    service
        .delete_conversation(user_id, ConversationId::new(id))
        .await?;

    Ok(Json(DeleteResponse {
        message: "Conversación eliminada".to_string(),
    }))
}

/// Deactivate all of the caller's conversations.
///
/// POST /api/chat/clear
async fn clear_conversations(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<ClearResponse>, AppError> {
    let service = ChatService::new(state.pool(), state.orchestrator());
    let cleared = service.clear_conversations(user_id).await?;

    Ok(Json(ClearResponse {
        message: "Todas las conversaciones han sido limpiadas".to_string(),
        cleared,
    }))
}

/// Aggregate stock statistics, without the natural-language rendering.
///
/// GET /api/chat/stock-summary
async fn stock_summary(
    State(state): State<AppState>,
    RequireUser(_user_id): RequireUser,
) -> Result<Json<StockSummaryResponse>, AppError> {
    let repo = InventoryRepository::new(state.pool());
    let summary = repo.stock_summary().await?;
    let top_brands = repo.brand_summary().await?;

    Ok(Json(StockSummaryResponse {
        summary,
        top_brands,
    }))
}

/// Check that a message is non-blank and within the length limit.
fn validate_message(message: &str) -> Result<&str, AppError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Message must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest(format!(
            "Message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use dealerdesk_core::TurnId;

    use crate::db::LastTurn;

    use super::*;

    #[test]
    fn test_validate_message_trims_and_accepts() {
        assert_eq!(validate_message("  hola  ").unwrap(), "hola");
    }

    #[test]
    fn test_validate_message_rejects_blank() {
        assert!(validate_message("").is_err());
        assert!(validate_message("   \n\t ").is_err());
    }

    #[test]
    fn test_validate_message_rejects_over_limit() {
        let message = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate_message(&message).is_err());

        let message = "a".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_message(&message).is_ok());
    }

    #[test]
    fn test_validate_message_counts_characters_not_bytes() {
        // 2000 multi-byte characters are within the limit.
        let message = "ñ".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_message(&message).is_ok());
    }

    #[test]
    fn test_list_item_truncates_last_turn_preview() {
        let overview = ConversationOverview {
            id: ConversationId::new(1),
            title: "Coches disponibles".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            turn_count: 4,
            last_turn: Some(LastTurn {
                content: "x".repeat(250),
                role: ChatRole::Assistant,
                created_at: Utc::now(),
            }),
        };

        let item = ConversationListItem::from(overview);
        let preview = item.last_turn.unwrap();
        assert_eq!(preview.content.chars().count(), LAST_TURN_PREVIEW_CHARS);
        assert_eq!(preview.role, ChatRole::Assistant);
    }

    #[test]
    fn test_turn_response_keeps_token_metadata() {
        let turn = ConversationTurn {
            id: TurnId::new(7),
            conversation_id: ConversationId::new(1),
            role: ChatRole::Assistant,
            content: "Hay 3 BMW disponibles.".to_string(),
            tokens_used: Some(512),
            model_used: Some("openai/gpt-oss-20b".to_string()),
            created_at: Utc::now(),
        };

        let response = TurnResponse::from(turn);
        assert_eq!(response.id, 7);
        assert_eq!(response.tokens_used, Some(512));
        assert_eq!(response.model_used.as_deref(), Some("openai/gpt-oss-20b"));
    }

    #[test]
    fn test_send_request_accepts_optional_conversation_id() {
        let with_id: SendMessageRequest =
            serde_json::from_str(r#"{"message": "hola", "conversation_id": 3}"#).unwrap();
        assert_eq!(with_id.conversation_id, Some(3));

        let without_id: SendMessageRequest =
            serde_json::from_str(r#"{"message": "hola"}"#).unwrap();
        assert_eq!(without_id.conversation_id, None);
    }
}
