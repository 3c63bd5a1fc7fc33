//! Component A: per-rail FIFO of historical rate segments.

use crate::types::{Amount, Epoch};

/// An interval of constant rate: "from the previous boundary up to and
/// including `until_epoch`, the rate was `rate`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, borsh::BorshSerialize, borsh::BorshDeserialize)]
pub struct RateChangeEntry {
    pub rate: Amount,
    pub until_epoch: Epoch,
}

/// FIFO of [`RateChangeEntry`]. Callers are responsible for keeping
/// `until_epoch` weakly monotonically increasing across entries and for
/// only enqueuing when the head (if any) has `until_epoch >= settled_up_to`.
#[derive(Debug, Clone, Default, PartialEq, Eq, borsh::BorshSerialize, borsh::BorshDeserialize)]
pub struct RateChangeQueue {
    entries: std::collections::VecDeque<RateChangeEntry>,
}

impl RateChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, rate: Amount, until_epoch: Epoch) {
        self.entries.push_back(RateChangeEntry { rate, until_epoch });
    }

    pub fn dequeue(&mut self) -> Option<RateChangeEntry> {
        self.entries.pop_front()
    }

    pub fn peek(&self) -> Option<&RateChangeEntry> {
        self.entries.front()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
