#[cfg(test)]
#[path = "state_sync_test.rs"]
mod tests;

use anyhow::Result;
use scout_ui_types::{AgentState, StatePatch};
use tokio::sync::mpsc;

use crate::domain::models::Event;

/// Sole owner of the agent state snapshot.
pub struct StateSynchronizer {
    snapshot: AgentState,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl StateSynchronizer {
    pub fn new(event_tx: mpsc::UnboundedSender<Event>) -> StateSynchronizer {
        return StateSynchronizer {
            snapshot: AgentState::default(),
            event_tx,
        };
    }

    pub fn snapshot(&self) -> &AgentState {
        return &self.snapshot;
    }

    /// Overwrites every field named in `patch`, leaves the rest untouched, then
    /// publishes the complete snapshot.
    pub fn apply_update(&mut self, patch: StatePatch) -> Result<()> {
        if let Some(running) = patch.running {
            self.snapshot.running = running;
        }
        if let Some(paused) = patch.paused {
            self.snapshot.paused = paused;
        }
        self.snapshot.extra.extend(patch.extra);

        log::debug!(
            "Agent state now running={} paused={} ({} extra fields)",
            self.snapshot.running,
            self.snapshot.paused,
            self.snapshot.extra.len()
        );

        self.event_tx
            .send(Event::StateChanged(self.snapshot.clone()))?;

        return Ok(());
    }
}
