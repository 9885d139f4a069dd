//! Core state types shared by the controller and the console.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

/// Name of the field telling whether a research run is active.
pub const RUNNING_FIELD: &str = "running";
/// Name of the field telling whether the active run is paused.
pub const PAUSED_FIELD: &str = "paused";

/// A scalar value carried by an open-ended agent state field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// A boolean flag.
    Bool(bool),
    /// A JSON number, kept exactly as received.
    Number(Number),
    /// A free-form string.
    Text(String),
}

impl StateValue {
    /// Convert a JSON value into a state value. Arrays, objects and null are not
    /// scalars and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => Some(Self::Number(number.clone())),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Convert back into a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(flag) => Value::Bool(*flag),
            Self::Number(number) => Value::Number(number.clone()),
            Self::Text(text) => Value::String(text.clone()),
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(flag) => write!(f, "{}", flag),
            Self::Number(number) => write!(f, "{}", number),
            Self::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

/// How the console should describe the remote agent.
///
/// `running == false` wins over `paused`: a stopped agent is idle whatever the
/// paused flag says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// No research run is active.
    Idle,
    /// A run is active and making progress.
    Running,
    /// A run is active but waiting to be resumed.
    Paused,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
        };
        f.write_str(label)
    }
}

/// The complete belief about the remote agent's run mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Whether a research run is active.
    #[serde(default)]
    pub running: bool,
    /// Whether the active run is paused. Only meaningful while `running` is true.
    #[serde(default)]
    pub paused: bool,
    /// Additional scalar fields the controller may report.
    #[serde(flatten)]
    pub extra: BTreeMap<String, StateValue>,
}

impl AgentState {
    /// Look up any field by its wire name.
    pub fn get(&self, name: &str) -> Option<StateValue> {
        match name {
            RUNNING_FIELD => Some(StateValue::Bool(self.running)),
            PAUSED_FIELD => Some(StateValue::Bool(self.paused)),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Interpret the flags for display.
    pub fn run_mode(&self) -> RunMode {
        if !self.running {
            RunMode::Idle
        } else if self.paused {
            RunMode::Paused
        } else {
            RunMode::Running
        }
    }
}

/// A partial agent state: only the fields that changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    /// New value for `running`, if it changed.
    pub running: Option<bool>,
    /// New value for `paused`, if it changed.
    pub paused: Option<bool>,
    /// New values for additional scalar fields.
    pub extra: BTreeMap<String, StateValue>,
}

impl StatePatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the `running` field.
    pub fn with_running(mut self, running: bool) -> Self {
        self.running = Some(running);
        self
    }

    /// Set the `paused` field.
    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = Some(paused);
        self
    }

    /// Set an additional field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Whether the patch names no field at all.
    pub fn is_empty(&self) -> bool {
        self.running.is_none() && self.paused.is_none() && self.extra.is_empty()
    }

    /// Build a patch from the fields of a `state` frame (without its `type`).
    ///
    /// `running` and `paused` must be booleans. Other non-scalar fields are
    /// skipped, since the state is flat by contract.
    pub fn from_fields(fields: Map<String, Value>) -> ProtocolResult<Self> {
        let mut patch = Self::new();
        for (name, value) in fields {
            match name.as_str() {
                RUNNING_FIELD => patch.running = Some(expect_bool(RUNNING_FIELD, &value)?),
                PAUSED_FIELD => patch.paused = Some(expect_bool(PAUSED_FIELD, &value)?),
                _ => match StateValue::from_json(&value) {
                    Some(scalar) => {
                        patch.extra.insert(name, scalar);
                    }
                    None => {
                        log::debug!("Ignoring non-scalar state field '{}'", name);
                    }
                },
            }
        }
        Ok(patch)
    }

    /// Render the patch as the fields of a `state` frame.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(running) = self.running {
            fields.insert(RUNNING_FIELD.to_string(), Value::Bool(running));
        }
        if let Some(paused) = self.paused {
            fields.insert(PAUSED_FIELD.to_string(), Value::Bool(paused));
        }
        for (name, value) in &self.extra {
            fields.insert(name.clone(), value.to_json());
        }
        fields
    }
}

fn expect_bool(field: &str, value: &Value) -> ProtocolResult<bool> {
    value.as_bool().ok_or_else(|| {
        ProtocolError::invalid_payload("state", format!("field '{}' must be a boolean", field))
    })
}

/// Severity of a log line reported by the controller.
///
/// Levels this side does not know decode as [`LogLevel::Other`] so that a new
/// level on the controller never costs the whole line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum LogLevel {
    /// Informational progress.
    #[default]
    Info,
    /// Something completed successfully.
    Success,
    /// Something needs attention.
    Warn,
    /// Something failed.
    Error,
    /// The agent is asking the operator a question.
    Question,
    /// The agent recorded a finding.
    Finding,
    /// Echo of an operator's own input.
    Human,
    /// Any level this side does not know.
    Other,
}

impl LogLevel {
    /// Parse a wire level. Unknown strings map to [`LogLevel::Other`].
    pub fn parse(level: &str) -> Self {
        match level {
            "info" => Self::Info,
            "success" => Self::Success,
            "warn" => Self::Warn,
            "error" => Self::Error,
            "question" => Self::Question,
            "finding" => Self::Finding,
            "human" => Self::Human,
            _ => Self::Other,
        }
    }

    /// The wire name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Question => "question",
            Self::Finding => "finding",
            Self::Human => "human",
            Self::Other => "other",
        }
    }
}

impl From<String> for LogLevel {
    fn from(level: String) -> Self {
        Self::parse(&level)
    }
}

impl From<LogLevel> for &'static str {
    fn from(level: LogLevel) -> Self {
        level.as_str()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
