//! Events sent by the controller to the console.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{LogLevel, StatePatch};

/// Name of the discriminator field of an inbound frame.
pub const EVENT_TAG: &str = "type";

/// Field of a `state` frame carrying the findings recorded so far.
pub const FINDINGS_FIELD: &str = "findings";

/// The type of event in the controller protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A partial update of the agent state.
    State,
    /// A log line.
    Log,
    /// A single finding.
    Finding,
    /// The outcome of a completed research run.
    Result,
}

impl EventType {
    /// Parse a wire tag.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "state" => Some(Self::State),
            "log" => Some(Self::Log),
            "finding" => Some(Self::Finding),
            "result" => Some(Self::Result),
            _ => None,
        }
    }

    /// The wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Log => "log",
            Self::Finding => "finding",
            Self::Result => "result",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event carrying the fields of the agent state that changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdateEvent {
    /// The changed fields.
    pub patch: StatePatch,
    /// Findings recorded so far, sent by the controller when a console connects.
    pub findings: Option<Vec<FindingEvent>>,
}

impl StateUpdateEvent {
    /// Create a new state update event.
    pub fn new(patch: StatePatch) -> Self {
        Self {
            patch,
            findings: None,
        }
    }

    /// Attach the findings backlog.
    pub fn with_findings(mut self, findings: Vec<FindingEvent>) -> Self {
        self.findings = Some(findings);
        self
    }

    fn from_fields(mut fields: Map<String, Value>) -> ProtocolResult<Self> {
        let findings = match fields.remove(FINDINGS_FIELD) {
            Some(Value::Null) | None => None,
            Some(value) => Some(
                serde_json::from_value::<Vec<FindingEvent>>(value).map_err(|e| {
                    ProtocolError::invalid_payload(EventType::State.as_str(), e.to_string())
                })?,
            ),
        };
        let patch = StatePatch::from_fields(fields)?;
        Ok(Self { patch, findings })
    }

    fn to_fields(&self) -> ProtocolResult<Map<String, Value>> {
        let mut fields = self.patch.to_fields();
        if let Some(findings) = &self.findings {
            fields.insert(FINDINGS_FIELD.to_string(), to_value(findings)?);
        }
        Ok(fields)
    }
}

/// Event carrying one log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// The text of the line.
    pub message: String,
    /// The severity; `info` when absent.
    #[serde(default)]
    pub level: LogLevel,
}

impl LogEvent {
    /// Create a new log event.
    pub fn new(message: impl Into<String>, level: LogLevel) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    /// Whether the line is a question the operator is expected to answer.
    pub fn is_question(&self) -> bool {
        self.level == LogLevel::Question
    }
}

/// Event carrying one item the agent found worth reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingEvent {
    /// Item name or description (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Current price or bid, as displayed by the listing (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Why the item is interesting (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Link to the listing (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Thumbnail link (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl FindingEvent {
    /// Create a new finding event with a title and a price.
    pub fn new(title: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            price: Some(price.into()),
            ..Default::default()
        }
    }

    /// Attach notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attach a listing link.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Event sent once a research run completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEvent {
    /// The agent's final summary.
    #[serde(default)]
    pub summary: String,
    /// Every finding recorded during the run.
    #[serde(default)]
    pub findings: Vec<FindingEvent>,
}

impl ResultEvent {
    /// Create a new result event.
    pub fn new(summary: impl Into<String>, findings: Vec<FindingEvent>) -> Self {
        Self {
            summary: summary.into(),
            findings,
        }
    }
}

/// Any event the controller can send.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A partial update of the agent state.
    State(StateUpdateEvent),
    /// A log line.
    Log(LogEvent),
    /// A single finding.
    Finding(FindingEvent),
    /// The outcome of a completed run.
    Result(ResultEvent),
}

impl InboundEvent {
    /// Get the event type.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::State(_) => EventType::State,
            Self::Log(_) => EventType::Log,
            Self::Finding(_) => EventType::Finding,
            Self::Result(_) => EventType::Result,
        }
    }

    /// Decode one text frame.
    ///
    /// Frames that are not JSON objects, lack a `type`, or carry a `type` this
    /// side does not know are errors; callers drop them.
    pub fn from_frame(frame: &str) -> ProtocolResult<Self> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| ProtocolError::invalid_json(e.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let tag = match fields.remove(EVENT_TAG) {
            Some(Value::String(tag)) => tag,
            _ => return Err(ProtocolError::missing_field(EVENT_TAG)),
        };

        match EventType::parse(&tag) {
            Some(EventType::State) => StateUpdateEvent::from_fields(fields).map(Self::State),
            Some(EventType::Log) => from_fields(EventType::Log, fields).map(Self::Log),
            Some(EventType::Finding) => from_fields(EventType::Finding, fields).map(Self::Finding),
            Some(EventType::Result) => from_fields(EventType::Result, fields).map(Self::Result),
            None => Err(ProtocolError::UnknownEventType { event_type: tag }),
        }
    }

    /// Encode the event as a text frame.
    pub fn to_frame(&self) -> ProtocolResult<String> {
        let mut fields = match self {
            Self::State(event) => event.to_fields()?,
            Self::Log(event) => to_object(event)?,
            Self::Finding(event) => to_object(event)?,
            Self::Result(event) => to_object(event)?,
        };
        fields.insert(
            EVENT_TAG.to_string(),
            Value::String(self.event_type().as_str().to_string()),
        );
        Ok(Value::Object(fields).to_string())
    }
}

fn from_fields<T: DeserializeOwned>(
    event_type: EventType,
    fields: Map<String, Value>,
) -> ProtocolResult<T> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ProtocolError::invalid_payload(event_type.as_str(), e.to_string()))
}

fn to_value<T: Serialize>(value: &T) -> ProtocolResult<Value> {
    serde_json::to_value(value).map_err(|e| ProtocolError::invalid_payload("event", e.to_string()))
}

fn to_object<T: Serialize>(value: &T) -> ProtocolResult<Map<String, Value>> {
    match to_value(value)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(ProtocolError::NotAnObject),
    }
}
