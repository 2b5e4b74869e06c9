//! Conversation orchestration: prompts, context windows, and the turn engine.

pub mod context;
pub mod engine;
pub mod prompt;
