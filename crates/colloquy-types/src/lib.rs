//! Shared domain types for Colloquy.
//!
//! This crate contains the core domain types used across the workspace:
//! Agent, memory messages, LLM request shapes, transcripts, configuration,
//! and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod agent;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod memory;
