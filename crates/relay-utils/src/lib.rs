//! Shared utilities for relay-bot
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup and typed environment-variable readers.

pub mod env;
pub mod logging;

pub use env::{EnvError, env_list, env_opt, env_parse};
pub use logging::init_tracing;
