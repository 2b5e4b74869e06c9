//! Conversation engine and repository trait definitions for Colloquy.
//!
//! This crate defines the "ports" (repository and backend traits) that the
//! infrastructure layer implements. It depends only on `colloquy-types` --
//! never on `colloquy-infra` or any database/IO crate.

pub mod conversation;
pub mod llm;
pub mod persona;
pub mod repository;
pub mod sanitize;

#[cfg(test)]
pub(crate) mod testing;
