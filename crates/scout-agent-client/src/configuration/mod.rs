//! Session configuration.
//!
//! The core reads no files or environment variables; whoever embeds it builds
//! a [`SessionConfig`] and hands it to the session manager.

mod config;

pub use config::*;
