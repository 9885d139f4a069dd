use std::collections::VecDeque;

use crate::domain::models::Finding;

/// Findings received during a console's lifetime, newest first.
///
/// Entries are never edited or deduplicated. The only bulk operation is
/// `restore`, which takes the controller's backlog as the new contents when a
/// session opens.
#[derive(Debug, Default)]
pub struct FindingLog {
    entries: VecDeque<Finding>,
}

impl FindingLog {
    pub fn new() -> FindingLog {
        return FindingLog::default();
    }

    pub fn record(&mut self, finding: Finding) {
        self.entries.push_front(finding);
    }

    /// Replaces the contents with a backlog given oldest first.
    pub fn restore(&mut self, backlog: Vec<Finding>) {
        self.entries = backlog.into_iter().rev().collect();
    }

    pub fn latest(&self) -> Option<&Finding> {
        return self.entries.front();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        return self.entries.iter();
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }
}
