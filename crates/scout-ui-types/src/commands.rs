//! Commands sent by the console to the controller.
//!
//! Commands are fire-and-forget: the controller never acknowledges them, and
//! nothing here validates `task` or `message` contents. Rejecting blank input
//! is the job of whoever builds the command.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

/// Name of the discriminator field of an outbound frame.
pub const COMMAND_TAG: &str = "action";

/// The kind of command in the controller protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    /// Begin a research run.
    Start,
    /// Pause the active run.
    Pause,
    /// Resume a paused run.
    Resume,
    /// Stop the active run.
    Stop,
    /// Answer a question asked by the agent.
    HumanInput,
}

impl CommandAction {
    /// Parse a wire action.
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "start" => Some(Self::Start),
            "pause" => Some(Self::Pause),
            "resume" => Some(Self::Resume),
            "stop" => Some(Self::Stop),
            "human_input" => Some(Self::HumanInput),
            _ => None,
        }
    }

    /// The wire action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::HumanInput => "human_input",
        }
    }
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Begin a research run on the given task.
    Start { task: String },
    /// Pause the active run.
    Pause,
    /// Resume a paused run.
    Resume,
    /// Stop the active run.
    Stop,
    /// Answer the agent's pending question.
    HumanInput { message: String },
}

#[derive(Deserialize)]
struct StartPayload {
    #[serde(default)]
    task: String,
}

#[derive(Deserialize)]
struct HumanInputPayload {
    #[serde(default)]
    message: String,
}

impl Command {
    /// Create a start command.
    pub fn start(task: impl Into<String>) -> Self {
        Self::Start { task: task.into() }
    }

    /// Create a human input command.
    pub fn human_input(message: impl Into<String>) -> Self {
        Self::HumanInput {
            message: message.into(),
        }
    }

    /// Get the command action.
    pub fn action(&self) -> CommandAction {
        match self {
            Self::Start { .. } => CommandAction::Start,
            Self::Pause => CommandAction::Pause,
            Self::Resume => CommandAction::Resume,
            Self::Stop => CommandAction::Stop,
            Self::HumanInput { .. } => CommandAction::HumanInput,
        }
    }

    /// Encode the command as a text frame. Every command encodes.
    pub fn to_frame(&self) -> String {
        let action = self.action().as_str();
        let value = match self {
            Self::Start { task } => json!({ COMMAND_TAG: action, "task": task }),
            Self::HumanInput { message } => json!({ COMMAND_TAG: action, "message": message }),
            Self::Pause | Self::Resume | Self::Stop => json!({ COMMAND_TAG: action }),
        };
        value.to_string()
    }

    /// Decode one text frame. Used by the controller side of the protocol.
    pub fn from_frame(frame: &str) -> ProtocolResult<Self> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| ProtocolError::invalid_json(e.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let action = match fields.remove(COMMAND_TAG) {
            Some(Value::String(action)) => action,
            _ => return Err(ProtocolError::missing_field(COMMAND_TAG)),
        };

        match CommandAction::parse(&action) {
            Some(CommandAction::Start) => {
                let payload: StartPayload = from_fields(CommandAction::Start, fields)?;
                Ok(Self::Start { task: payload.task })
            }
            Some(CommandAction::HumanInput) => {
                let payload: HumanInputPayload = from_fields(CommandAction::HumanInput, fields)?;
                Ok(Self::HumanInput {
                    message: payload.message,
                })
            }
            Some(CommandAction::Pause) => Ok(Self::Pause),
            Some(CommandAction::Resume) => Ok(Self::Resume),
            Some(CommandAction::Stop) => Ok(Self::Stop),
            None => Err(ProtocolError::UnknownAction { action }),
        }
    }
}

fn from_fields<T: serde::de::DeserializeOwned>(
    action: CommandAction,
    fields: Map<String, Value>,
) -> ProtocolResult<T> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ProtocolError::invalid_payload(action.as_str(), e.to_string()))
}
