//! HTTP middleware and extractors for the admin API.
//!
//! The heavier layers (tracing, CORS, Sentry) are assembled in `main`;
//! this module holds the per-request extractors.

pub mod auth;

pub use auth::RequireUser;
