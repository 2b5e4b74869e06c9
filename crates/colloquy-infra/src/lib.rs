//! Infrastructure layer for Colloquy.
//!
//! Contains implementations of the traits defined in `colloquy-core`: SQLite
//! storage for agents and their memory, the HTTP LLM backends, and loading of
//! the global configuration file.

pub mod config;
pub mod llm;
pub mod sqlite;
