//! FIFO queue of explicitly triggered follow-up cards.

use std::collections::VecDeque;
use throne_core::CardId;
use tracing::debug;

/// Pending chained cards. The front of the queue always wins over weighted
/// selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainScheduler {
    queue: VecDeque<CardId>,
}

impl ChainScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append ids in declaration order.
    pub fn enqueue<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a CardId>,
    {
        for id in ids {
            debug!(card = %id, "chain enqueued");
            self.queue.push_back(id.clone());
        }
    }

    pub fn dequeue_next(&mut self) -> Option<CardId> {
        self.queue.pop_front()
    }

    pub fn peek(&self) -> Option<&CardId> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Pending ids, front first.
    pub fn pending(&self) -> impl Iterator<Item = &CardId> {
        self.queue.iter()
    }
}
