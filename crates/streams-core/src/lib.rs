//! Shared types for the streaming-history tools.
//!
//! Records and summaries, the error type, title-casing strategies, progress
//! reporting and command-line settings.

pub mod error;
pub mod models;
pub mod progress;
pub mod settings;
pub mod text;
pub mod timestamps;
