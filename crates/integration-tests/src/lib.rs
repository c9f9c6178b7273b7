//! Integration tests for DealerDesk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dealerdesk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `orchestrator_fallback` - Model fallback behavior against a scripted
//!   backend, no live OpenRouter calls
//! - `context_builder` - Stock context rendering over the in-memory stats
//!   source, no database
