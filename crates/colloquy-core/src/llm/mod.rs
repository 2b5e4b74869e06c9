//! LLM backend abstractions for Colloquy.
//!
//! - `LlmProvider`: RPITIT trait for concrete backend implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `BackendAdapter`: the generate-a-reply port used by the turn engine

pub mod adapter;
pub mod box_provider;
pub mod provider;
