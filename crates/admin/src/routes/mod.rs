//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness check
//! GET    /up                            - Readiness check (DB ping)
//!
//! # Chat (stock assistant)
//! POST   /api/chat/send                 - Send a message, get the reply
//! GET    /api/chat/conversations        - List the caller's conversations
//! GET    /api/chat/conversation/{id}    - Get a conversation with its turns
//! DELETE /api/chat/conversation/{id}    - Soft-delete a conversation
//! POST   /api/chat/clear                - Deactivate all conversations
//! GET    /api/chat/stock-summary        - Aggregate stock statistics
//! ```

use axum::Router;

use crate::state::AppState;

pub mod chat;

/// Build the application router with all API routes.
pub fn router() -> Router<AppState> {
    Router::new().merge(chat::router())
}
