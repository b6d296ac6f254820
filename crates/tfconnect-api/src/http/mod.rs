//! HTTP layer for tfconnect.
//!
//! Axum server with a single action webhook at `/`, a health check, and
//! envelope response format.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
