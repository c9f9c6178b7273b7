//! Chat domain models for the AI assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealerdesk_core::{ChatRole, ConversationId, TurnId, UserId};

/// A conversation with the stock assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID.
    pub id: ConversationId,
    /// User who owns this conversation.
    pub user_id: UserId,
    /// Title derived from the first message.
    pub title: String,
    /// Soft-delete flag. Inactive conversations are hidden everywhere.
    pub is_active: bool,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When the conversation last received a turn.
    pub updated_at: DateTime<Utc>,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Unique turn ID.
    pub id: TurnId,
    /// Conversation this turn belongs to.
    pub conversation_id: ConversationId,
    /// Role of the turn author.
    pub role: ChatRole,
    /// Turn text.
    pub content: String,
    /// Total tokens billed for this turn (assistant turns only).
    pub tokens_used: Option<i32>,
    /// Model that generated this turn (assistant turns only).
    pub model_used: Option<String>,
    /// When the turn was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_serialization() {
        let conversation = Conversation {
            id: ConversationId::new(1),
            user_id: UserId::new(1),
            title: "Coches BMW disponibles".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&conversation).expect("serialize");
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"title\":\"Coches BMW disponibles\""));
        assert!(json.contains("\"is_active\":true"));
    }

    #[test]
    fn test_conversation_turn_serialization() {
        let turn = ConversationTurn {
            id: TurnId::new(1),
            conversation_id: ConversationId::new(1),
            role: ChatRole::Assistant,
            content: "Hay 3 BMW disponibles.".to_string(),
            tokens_used: Some(128),
            model_used: Some("openai/gpt-oss-20b".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&turn).expect("serialize");
        assert!(json.contains("\"role\":\"assistant\""));
        assert!(json.contains("\"tokens_used\":128"));
        assert!(json.contains("\"model_used\":\"openai/gpt-oss-20b\""));
    }
}
