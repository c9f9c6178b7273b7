//! Database operations for conversations and turns.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument};

use dealerdesk_core::{ChatRole, ConversationId, TurnId, UserId};

use super::RepositoryError;
use crate::models::chat::{Conversation, ConversationTurn};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` conversation queries.
#[derive(Debug, sqlx::FromRow)]
struct ConversationRow {
    id: i32,
    user_id: i32,
    title: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: ConversationId::new(row.id),
            user_id: UserId::new(row.user_id),
            title: row.title,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for `PostgreSQL` turn queries.
#[derive(Debug, sqlx::FromRow)]
struct TurnRow {
    id: i32,
    conversation_id: i32,
    role: ChatRole,
    content: String,
    tokens_used: Option<i32>,
    model_used: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TurnRow> for ConversationTurn {
    fn from(row: TurnRow) -> Self {
        Self {
            id: TurnId::new(row.id),
            conversation_id: ConversationId::new(row.conversation_id),
            role: row.role,
            content: row.content,
            tokens_used: row.tokens_used,
            model_used: row.model_used,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for the conversation list query.
#[derive(Debug, sqlx::FromRow)]
struct OverviewRow {
    id: i32,
    title: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    turn_count: i64,
    last_content: Option<String>,
    last_role: Option<ChatRole>,
    last_created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// List Projections
// =============================================================================

/// A conversation with list-view metadata (turn count, last turn).
#[derive(Debug, Clone)]
pub struct ConversationOverview {
    /// Conversation ID.
    pub id: ConversationId,
    /// Conversation title.
    pub title: String,
    /// Soft-delete flag (always true for listed conversations).
    pub is_active: bool,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When the conversation last received a turn.
    pub updated_at: DateTime<Utc>,
    /// Number of turns in the conversation.
    pub turn_count: i64,
    /// The most recent turn, if any.
    pub last_turn: Option<LastTurn>,
}

/// The most recent turn of a conversation, for list previews.
#[derive(Debug, Clone)]
pub struct LastTurn {
    /// Full turn text (callers truncate for previews).
    pub content: String,
    /// Role of the turn author.
    pub role: ChatRole,
    /// When the turn was created.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OverviewRow> for ConversationOverview {
    type Error = RepositoryError;

    fn try_from(row: OverviewRow) -> Result<Self, Self::Error> {
        let last_turn = match (row.last_content, row.last_role, row.last_created_at) {
            (Some(content), Some(role), Some(created_at)) => Some(LastTurn {
                content,
                role,
                created_at,
            }),
            (None, None, None) => None,
            _ => {
                return Err(RepositoryError::DataCorruption(format!(
                    "conversation {} has a partial last turn",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: ConversationId::new(row.id),
            title: row.title,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            turn_count: row.turn_count,
            last_turn,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for conversation database operations.
pub struct ChatRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ChatRepository<'a> {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new conversation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, title), fields(user_id = %user_id))]
    pub async fn create_conversation(
        &self,
        user_id: UserId,
        title: &str,
    ) -> Result<Conversation, RepositoryError> {
        let row: ConversationRow = sqlx::query_as(
            r"
            INSERT INTO conversations (user_id, title)
            VALUES ($1, $2)
            RETURNING id, user_id, title, is_active, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(title)
        .fetch_one(self.pool)
        .await?;

        debug!(conversation_id = row.id, "Created conversation");
        Ok(row.into())
    }

    /// Get an active conversation owned by the given user.
    ///
    /// Returns `None` for missing, soft-deleted, or foreign conversations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_conversation(
        &self,
        id: ConversationId,
        user_id: UserId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row: Option<ConversationRow> = sqlx::query_as(
            r"
            SELECT id, user_id, title, is_active, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2 AND is_active
            ",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List the user's active conversations, newest activity first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_conversations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ConversationOverview>, RepositoryError> {
        let rows: Vec<OverviewRow> = sqlx::query_as(
            r"
            SELECT c.id, c.title, c.is_active, c.created_at, c.updated_at,
                   COALESCE(tc.turn_count, 0) AS turn_count,
                   lt.content AS last_content,
                   lt.role AS last_role,
                   lt.created_at AS last_created_at
            FROM conversations c
            LEFT JOIN (
                SELECT conversation_id, COUNT(*) AS turn_count
                FROM conversation_turns
                GROUP BY conversation_id
            ) tc ON tc.conversation_id = c.id
            LEFT JOIN LATERAL (
                SELECT content, role, created_at
                FROM conversation_turns
                WHERE conversation_id = c.id
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            ) lt ON TRUE
            WHERE c.user_id = $1 AND c.is_active
            ORDER BY c.updated_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Soft delete a conversation (sets `is_active` to false).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the conversation does not
    /// exist, is already deleted, or belongs to another user.
    #[instrument(skip(self), fields(conversation_id = %id, user_id = %user_id))]
    pub async fn soft_delete(
        &self,
        id: ConversationId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE conversations
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND is_active
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        debug!("Soft deleted conversation");
        Ok(())
    }

    /// Soft delete all of the user's active conversations.
    ///
    /// Returns the number of conversations deactivated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear_all(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE conversations
            SET is_active = FALSE, updated_at = NOW()
            WHERE user_id = $1 AND is_active
            ",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        let cleared = result.rows_affected();
        debug!(cleared, "Cleared conversations");
        Ok(cleared)
    }

    /// Append a turn to a conversation and bump its `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including
    /// foreign key violations for unknown conversations).
    #[instrument(
        skip(self, content, model_used),
        fields(conversation_id = %conversation_id, role = %role)
    )]
    pub async fn add_turn(
        &self,
        conversation_id: ConversationId,
        role: ChatRole,
        content: &str,
        tokens_used: Option<i32>,
        model_used: Option<&str>,
    ) -> Result<ConversationTurn, RepositoryError> {
        // The unreferenced CTE still executes, keeping insert and touch in
        // one round trip without an explicit transaction.
        let row: TurnRow = sqlx::query_as(
            r"
            WITH touched AS (
                UPDATE conversations SET updated_at = NOW() WHERE id = $1
            )
            INSERT INTO conversation_turns
                (conversation_id, role, content, tokens_used, model_used)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, role, content,
                      tokens_used, model_used, created_at
            ",
        )
        .bind(conversation_id)
        .bind(role)
        .bind(content)
        .bind(tokens_used)
        .bind(model_used)
        .fetch_one(self.pool)
        .await?;

        debug!(turn_id = row.id, "Added turn");
        Ok(row.into())
    }

    /// List all turns of a conversation in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_turns(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let rows: Vec<TurnRow> = sqlx::query_as(
            r"
            SELECT id, conversation_id, role, content,
                   tokens_used, model_used, created_at
            FROM conversation_turns
            WHERE conversation_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(conversation_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_row_without_turns_has_no_last_turn() {
        let row = OverviewRow {
            id: 1,
            title: "Nueva conversación".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            turn_count: 0,
            last_content: None,
            last_role: None,
            last_created_at: None,
        };

        let overview = ConversationOverview::try_from(row).unwrap();
        assert!(overview.last_turn.is_none());
        assert_eq!(overview.turn_count, 0);
    }

    #[test]
    fn test_overview_row_maps_last_turn() {
        let now = Utc::now();
        let row = OverviewRow {
            id: 1,
            title: "Coches disponibles".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            turn_count: 4,
            last_content: Some("Hay 3 BMW disponibles.".to_string()),
            last_role: Some(ChatRole::Assistant),
            last_created_at: Some(now),
        };

        let overview = ConversationOverview::try_from(row).unwrap();
        let last = overview.last_turn.unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "Hay 3 BMW disponibles.");
    }

    #[test]
    fn test_overview_row_with_partial_last_turn_is_corruption() {
        let now = Utc::now();
        let row = OverviewRow {
            id: 7,
            title: "Rota".to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
            turn_count: 1,
            last_content: Some("hola".to_string()),
            last_role: None,
            last_created_at: Some(now),
        };

        let err = ConversationOverview::try_from(row).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
