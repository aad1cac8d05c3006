use std::collections::VecDeque;

use super::types::SessionEvent;

/// Bounded buffer of session events awaiting the boundary. When full, the
/// oldest coalescable event is evicted, then the oldest event of any kind.
pub struct EventQueue {
    pending: VecDeque<SessionEvent>,
    max_pending: usize,
    dropped: u64,
}

impl EventQueue {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(max_pending),
            max_pending: max_pending.max(1),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: SessionEvent) {
        if event.is_coalescable() && self.pending.iter().any(SessionEvent::is_coalescable) {
            return;
        }

        if self.pending.len() >= self.max_pending {
            self.evict_one();
        }

        self.pending.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<SessionEvent> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Events evicted since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn evict_one(&mut self) {
        let index = self
            .pending
            .iter()
            .position(SessionEvent::is_coalescable)
            .unwrap_or(0);
        if self.pending.remove(index).is_some() {
            self.dropped += 1;
        }
    }
}
