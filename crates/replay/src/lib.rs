//! `bienestar-replay` library crate.
//!
//! Timer-driven playback of stroke recordings. The binary entrypoint lives
//! in `main.rs`.

pub mod player;
pub mod speed;
pub mod surface;
