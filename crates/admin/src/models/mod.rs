//! Domain models for the DealerDesk back office.
//!
//! # Models
//!
//! - `chat` - Conversations and turns for the AI assistant
//! - `vehicle` - Stock vehicles and the aggregates derived from them

pub mod chat;
pub mod vehicle;

pub use chat::{Conversation, ConversationTurn};
pub use vehicle::{BrandSummary, PRICE_BANDS, PriceBucket, StockSummary, Vehicle};
