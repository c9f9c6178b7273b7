//! DealerDesk Admin library.
//!
//! This crate provides the dealership back-office API as a library,
//! allowing it to be tested and reused:
//!
//! - Chat orchestration over the OpenRouter API with model fallback
//! - Inventory statistics rendered into the assistant's context block
//! - Conversation persistence in `PostgreSQL`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod openrouter;
pub mod routes;
pub mod services;
pub mod state;
