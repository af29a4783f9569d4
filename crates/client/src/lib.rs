//! Typed client for the Bienestar backend.
//!
//! [`api::ApiClient`] handles transport concerns (bearer token, response
//! envelope, error mapping, session expiry). The [`services`] modules wrap
//! each endpoint group with domain types from `bienestar-core`.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
