use scout_ui_types::{AgentState, LogLevel};

use super::ConnectionState;
use super::Finding;

/// Everything the core tells the presentation layer, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The complete agent state after a merge.
    StateChanged(AgentState),
    Log { message: String, level: LogLevel },
    Finding(Finding),
    /// Findings the controller already held when this session opened, oldest first.
    FindingsRestored(Vec<Finding>),
    /// The agent asked the operator something; answer with a human input command.
    Question(String),
    RunCompleted {
        summary: String,
        findings: Vec<Finding>,
    },
    ConnectionStatus(ConnectionState),
    Diagnostic(String),
}
