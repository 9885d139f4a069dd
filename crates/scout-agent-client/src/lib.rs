//! Client core of the scout research console
//!
//! This crate keeps one console in sync with a remote research controller. It
//! owns the transport session (connect, detect closure, reconnect after a fixed
//! delay), folds partial state updates into a single authoritative snapshot,
//! and routes every inbound frame to the presentation layer as an [`Event`].
//! Operator commands travel the other way through a [`SessionHandle`] and are
//! dropped silently while no session is open.
//!
//! The presentation layer only ever receives copies: it reads [`Event`]s from a
//! channel and never writes back into the connection or agent state.

pub mod configuration;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use configuration::SessionConfig;
pub use domain::models::{ConnectionState, Event, Finding};
pub use domain::services::{
    Dispatcher, FindingLog, Lifecycle, ReconnectTicket, SessionHandle, SessionManager,
    StateSynchronizer,
};
pub use error::TransportError;
pub use infrastructure::transport::{Connector, Transport, WebSocketConnector};
pub use scout_ui_types::{AgentState, Command, LogLevel, RunMode, StatePatch};
