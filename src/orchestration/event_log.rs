//! Bounded diagnostic log of workflow events.
//!
//! Replaces ad hoc grow-forever debug state: fixed capacity, oldest entries
//! evicted first, exposed for inspection but never consulted for control
//! flow.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::events::WorkflowEvent;

/// One recorded workflow event
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub recorded_at: DateTime<Utc>,
    pub event: WorkflowEvent,
}

/// Fixed-capacity ring of recent workflow events
pub struct EventLog {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    pub fn record(&self, event: WorkflowEvent) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            recorded_at: Utc::now(),
            event,
        });
    }

    /// Copy of the log, oldest first
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TraitKind;

    fn completed(trait_kind: TraitKind) -> WorkflowEvent {
        WorkflowEvent::TraitCompleted { trait_kind }
    }

    #[test]
    fn test_records_in_order() {
        let log = EventLog::new(8);
        log.record(completed(TraitKind::Openness));
        log.record(completed(TraitKind::Extraversion));

        let entries = log.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, completed(TraitKind::Openness));
        assert_eq!(entries[1].event, completed(TraitKind::Extraversion));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = EventLog::new(3);
        for trait_kind in TraitKind::ALL {
            log.record(completed(trait_kind));
        }
        assert_eq!(log.len(), 3);
        let entries = log.snapshot();
        assert_eq!(entries[0].event, completed(TraitKind::Extraversion));
        assert_eq!(entries[2].event, completed(TraitKind::Neuroticism));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let log = EventLog::new(0);
        log.record(WorkflowEvent::AllTraitsCompleted);
        assert_eq!(log.len(), 1);
        assert_eq!(log.capacity(), 1);
    }
}
