//! Terminal operator console for the scout research agent
//!
//! Reads operator commands line by line from stdin, validates them before
//! they become protocol commands, and prints the agent state, logs, findings,
//! questions and connection status reported by the client core.

pub mod config;
pub mod console;
pub mod error;
pub mod input;
