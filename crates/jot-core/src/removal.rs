use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

/// Delay between a removal request and the actual delete, long enough for the
/// row's exit transition to play.
pub const REMOVE_DELAY: Duration = Duration::milliseconds(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRemoval {
    id: u64,
    due_at: DateTime<Utc>,
}

/// Deferred deletes, fired in the order they were scheduled.
///
/// Entries are never cancelled. Scheduling an id twice queues two deletes; the
/// second one finds nothing to remove.
#[derive(Debug, Clone, Default)]
pub struct RemovalQueue {
    pending: VecDeque<PendingRemoval>,
}

impl RemovalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, id: u64, due_at: DateTime<Utc>) {
        trace!(id, %due_at, "scheduling removal");
        self.pending.push_back(PendingRemoval { id, due_at });
    }

    pub fn is_pending(&self, id: u64) -> bool {
        self.pending.iter().any(|entry| entry.id == id)
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.pending.iter().map(|entry| entry.due_at).min()
    }

    /// Removes and returns every id whose deadline is at or before `now`.
    pub fn drain_due(&mut self, now: DateTime<Utc>) -> Vec<u64> {
        let mut due = Vec::new();
        self.pending.retain(|entry| {
            if entry.due_at <= now {
                due.push(entry.id);
                false
            } else {
                true
            }
        });
        due
    }

    /// Puts ids taken by [`drain_due`](Self::drain_due) back at the head of
    /// the queue, in their original order, due at `due_at`.
    pub fn requeue(&mut self, ids: &[u64], due_at: DateTime<Utc>) {
        for &id in ids.iter().rev() {
            self.pending.push_front(PendingRemoval { id, due_at });
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
