//! Type definitions for the console/controller wire protocol
//!
//! This crate is the contract both ends of the research console agree on: the
//! events a controller sends (state updates, log lines, findings, run results)
//! and the commands a console sends back (start, pause, resume, stop, answer).
//! Frames are JSON text objects; inbound frames are discriminated by `type`,
//! outbound frames by `action`.
//!
//! ## Example
//!
//! ```rust
//! use scout_ui_types::{Command, InboundEvent};
//!
//! let frame = Command::start("vintage walkman under $50").to_frame();
//! assert!(frame.contains("\"action\":\"start\""));
//!
//! let event = InboundEvent::from_frame(r#"{"type":"state","running":true}"#).unwrap();
//! assert!(matches!(event, InboundEvent::State(_)));
//! ```

pub mod commands;
pub mod error;
pub mod events;
pub mod types;

pub use commands::*;
pub use error::*;
pub use events::*;
pub use types::*;
