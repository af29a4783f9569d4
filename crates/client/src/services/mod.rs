//! Typed wrappers over the backend endpoints, one module per portal area.
//!
//! Each wrapper borrows the [`ApiClient`](crate::api::ApiClient) and is
//! obtained from it, e.g. `api.notes().list(user_id)`.

pub mod appointments;
pub mod attendance;
pub mod auth;
pub mod chatbot;
pub mod drawings;
pub mod face;
pub mod notes;
pub mod psychologist;
pub mod recommendations;
