//! Scripted stand-in for the research controller
//!
//! Speaks the console wire protocol over a websocket at `/ws`. A connecting
//! console first receives the full agent state and the findings recorded so
//! far; a `start` command replays a fixed script of state, log and finding
//! frames and ends with a result. Run controls only flip the mock's flags.

pub mod handlers;
pub mod script;
pub mod server;

pub use script::{Script, Step};
pub use server::MockController;
