//! DealerDesk Core - Shared types library.
//!
//! This crate provides common types used across all DealerDesk components:
//! - `admin` - Back-office API (inventory stats + AI chat assistant)
//! - `cli` - Command-line tools for migrations and stock seeding
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, chat roles, and VINs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
