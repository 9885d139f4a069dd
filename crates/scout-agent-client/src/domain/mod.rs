//! Core domain logic for the console.
//!
//! This module holds the session lifecycle, the state snapshot and the frame
//! router, independent of the concrete transport underneath.

pub mod models;
pub mod services;
