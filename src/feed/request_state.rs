use std::collections::HashMap;

use crate::domain::UniqueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Reaction,
    Delete,
    Edit,
    Save,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Error(String),
}

#[derive(Debug, Default)]
struct Entry {
    state: RequestState,
    in_flight: u32,
}

/// Per-item, per-operation request bookkeeping.
#[derive(Debug, Default)]
pub struct RequestTracker {
    entries: HashMap<(UniqueId, Operation), Entry>,
}

impl RequestTracker {
    pub fn state(&self, id: UniqueId, op: Operation) -> RequestState {
        self.entries
            .get(&(id, op))
            .map(|e| e.state.clone())
            .unwrap_or_default()
    }

    pub fn is_pending(&self, id: UniqueId, op: Operation) -> bool {
        self.state(id, op) == RequestState::Pending
    }

    pub fn begin(&mut self, id: UniqueId, op: Operation) {
        let entry = self.entries.entry((id, op)).or_default();
        entry.in_flight += 1;
        entry.state = RequestState::Pending;
    }

    /// Record a finished request. The entry stays `Pending` while other
    /// requests for the same item and operation are still out.
    pub fn finish(&mut self, id: UniqueId, op: Operation, error: Option<String>) {
        let entry = self.entries.entry((id, op)).or_default();
        entry.in_flight = entry.in_flight.saturating_sub(1);
        entry.state = match error {
            Some(message) => RequestState::Error(message),
            None if entry.in_flight > 0 => RequestState::Pending,
            None => RequestState::Idle,
        };

        if entry.state == RequestState::Idle {
            self.entries.remove(&(id, op));
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
