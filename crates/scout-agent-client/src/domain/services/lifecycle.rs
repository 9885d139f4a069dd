#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;

use crate::domain::models::ConnectionState;

/// A reconnect attempt scheduled for one closed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectTicket {
    pub generation: u64,
}

/// Connection lifecycle bookkeeping for a single session manager.
///
/// Every connection attempt gets a new generation. A reconnect ticket only
/// fires if no other attempt started since it was issued, which keeps a stale
/// timer from opening a second transport after a manual reconnect.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: ConnectionState,
    generation: u64,
}

impl Lifecycle {
    pub fn new() -> Lifecycle {
        return Lifecycle::default();
    }

    pub fn state(&self) -> ConnectionState {
        return self.state;
    }

    pub fn generation(&self) -> u64 {
        return self.generation;
    }

    /// Starts a new attempt. Refused while an attempt is in flight or a
    /// transport is live, so there is never more than one.
    pub fn begin_connect(&mut self) -> Option<u64> {
        if self.state != ConnectionState::Disconnected {
            return None;
        }

        self.generation += 1;
        self.state = ConnectionState::Connecting;
        return Some(self.generation);
    }

    pub fn opened(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state != ConnectionState::Connecting {
            return false;
        }

        self.state = ConnectionState::Connected;
        return true;
    }

    /// Records the end of the attempt or session of `generation`. Returns the
    /// single reconnect ticket to schedule, or `None` if that generation was
    /// already closed or superseded.
    pub fn closed(&mut self, generation: u64) -> Option<ReconnectTicket> {
        if generation != self.generation || self.state == ConnectionState::Disconnected {
            return None;
        }

        self.state = ConnectionState::Disconnected;
        return Some(ReconnectTicket { generation });
    }

    pub fn is_due(&self, ticket: ReconnectTicket) -> bool {
        return ticket.generation == self.generation && self.state == ConnectionState::Disconnected;
    }
}
