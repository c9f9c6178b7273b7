//! Core types for DealerDesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod role;
pub mod vin;

pub use id::*;
pub use role::ChatRole;
pub use vin::{Vin, VinError};
