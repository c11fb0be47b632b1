//! The pending-consumer queue.

use std::sync::Weak;

use crate::config::ConsumerIdentity;
use super::DependencyConsumer;

/// A consumer waiting for its dependencies, held weakly.
#[derive(Clone)]
pub(crate) struct PendingConsumer {
    pub(crate) identity: ConsumerIdentity,
    pub(crate) consumer: Weak<dyn DependencyConsumer>,
    // Address of the consumer object; identity for dedup and removal.
    // The weak handle pins the allocation, so no other consumer can reuse it
    // while this entry (or a sweep snapshot of it) exists.
    pub(crate) addr: usize,
}

/// Ordered, duplicate-free queue keyed by consumer address.
#[derive(Default)]
pub(crate) struct PendingQueue {
    entries: Vec<PendingConsumer>,
}

impl PendingQueue {
    /// Appends unless already queued; returns false for duplicates.
    pub(crate) fn insert(&mut self, entry: PendingConsumer) -> bool {
        if self.contains(entry.addr) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub(crate) fn remove(&mut self, addr: usize) -> Option<PendingConsumer> {
        let pos = self.entries.iter().position(|entry| entry.addr == addr)?;
        Some(self.entries.remove(pos))
    }

    pub(crate) fn contains(&self, addr: usize) -> bool {
        self.entries.iter().any(|entry| entry.addr == addr)
    }

    /// Copy of the queue to iterate while the queue itself changes.
    pub(crate) fn snapshot(&self) -> Vec<PendingConsumer> {
        self.entries.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
