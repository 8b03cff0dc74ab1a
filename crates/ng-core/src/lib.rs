//! Core types and utilities for ng-agent
//!
//! # Modules
//!
//! - `config`: Environment loading and the agent configuration
//! - `error`: Error taxonomy and Result alias
//! - `text`: Character-budget helpers shared by the chat loop and tools

pub mod config;
pub mod error;
pub mod text;

// Re-exports
pub use config::AgentConfig;
pub use error::{Error, Result};
