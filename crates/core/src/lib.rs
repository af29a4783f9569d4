//! Domain types and pure logic for the Bienestar client.
//!
//! No network access lives here: stroke-recording decoding, the session
//! store, form validation, route guarding, and the per-user cache.

pub mod access;
pub mod cache;
pub mod drawing;
pub mod error;
pub mod session;
pub mod types;
pub mod validation;
