use anyhow::Result;
use scout_ui_types::{InboundEvent, ProtocolError};
use tokio::sync::mpsc;

use super::StateSynchronizer;
use crate::domain::models::{Event, Finding};

/// Routes decoded controller frames to the synchronizer or straight to the
/// presentation layer. Keeps no state beyond its two destinations.
pub struct Dispatcher {
    synchronizer: StateSynchronizer,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl Dispatcher {
    pub fn new(event_tx: mpsc::UnboundedSender<Event>) -> Dispatcher {
        return Dispatcher {
            synchronizer: StateSynchronizer::new(event_tx.clone()),
            event_tx,
        };
    }

    pub fn synchronizer(&self) -> &StateSynchronizer {
        return &self.synchronizer;
    }

    /// Handles one raw text frame. Frames that do not decode are dropped with a
    /// warning and never end the session; only a vanished presentation layer
    /// is an error.
    pub fn on_message(&mut self, frame: &str) -> Result<()> {
        match InboundEvent::from_frame(frame) {
            Ok(event) => self.dispatch(event),
            Err(err @ ProtocolError::UnknownEventType { .. }) => {
                log::warn!("Ignoring controller frame: {}", err);
                Ok(())
            }
            Err(err) => {
                log::warn!("Dropping undecodable controller frame: {} ({})", err, frame);
                Ok(())
            }
        }
    }

    pub fn dispatch(&mut self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::State(update) => {
                self.synchronizer.apply_update(update.patch)?;
                if let Some(backlog) = update.findings {
                    let findings = backlog.into_iter().map(Finding::from).collect();
                    self.event_tx.send(Event::FindingsRestored(findings))?;
                }
            }
            InboundEvent::Log(log_event) => {
                let question = log_event.is_question();
                let message = log_event.message;
                self.event_tx.send(Event::Log {
                    message: message.clone(),
                    level: log_event.level,
                })?;
                if question {
                    self.event_tx.send(Event::Question(message))?;
                }
            }
            InboundEvent::Finding(finding) => {
                self.event_tx.send(Event::Finding(Finding::from(finding)))?;
            }
            InboundEvent::Result(result) => {
                self.event_tx.send(Event::RunCompleted {
                    summary: result.summary,
                    findings: result.findings.into_iter().map(Finding::from).collect(),
                })?;
            }
        }

        Ok(())
    }
}
