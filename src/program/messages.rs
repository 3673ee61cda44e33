//! Message buffers between supersteps.
//!
//! Messages follow the same double-buffering as memory: what a vertex sends
//! during superstep `s` lands in the [`Outbox`], and only becomes readable
//! through the [`Inbox`] of superstep `s + 1`.

use dashmap::DashMap;
use hashbrown::HashMap;

use crate::graph::VertexId;

/// Concurrent sink for messages sent during a superstep.
#[derive(Debug)]
pub struct Outbox<M> {
    pending: DashMap<VertexId, Vec<M>>,
}

impl<M> Outbox<M> {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    #[inline]
    pub fn send(&self, target: VertexId, message: M) {
        self.pending.entry(target).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Seals the outbox into the next superstep's inbox, keeping only
    /// messages whose target satisfies `exists`.
    pub fn into_inbox(self, exists: impl Fn(VertexId) -> bool) -> Inbox<M> {
        let mut delivered = HashMap::with_capacity(self.pending.len());
        for (target, messages) in self.pending {
            if exists(target) {
                delivered.insert(target, messages);
            } else {
                log::warn!(
                    "dropping {} message(s) addressed to unknown vertex {target}",
                    messages.len()
                );
            }
        }
        Inbox { delivered }
    }
}

impl<M> Default for Outbox<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Messages readable during a superstep, grouped by recipient.
#[derive(Debug)]
pub struct Inbox<M> {
    delivered: HashMap<VertexId, Vec<M>>,
}

impl<M> Inbox<M> {
    pub fn empty() -> Self {
        Self {
            delivered: HashMap::new(),
        }
    }

    /// Messages for `id`; empty when none arrived.
    pub fn messages(&self, id: VertexId) -> &[M] {
        self.delivered.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_messages(&self, id: VertexId) -> bool {
        self.delivered.get(&id).is_some_and(|m| !m.is_empty())
    }

    /// Total number of delivered messages.
    pub fn len(&self) -> usize {
        self.delivered.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<M> Default for Inbox<M> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn concurrent_sends_are_all_delivered() {
        let outbox = Outbox::new();
        (0..1000u64).into_par_iter().for_each(|i| {
            outbox.send(VertexId::new(i % 4), i);
        });
        let inbox = outbox.into_inbox(|_| true);
        assert_eq!(inbox.len(), 1000);
        let mut got = inbox.messages(VertexId::new(1)).to_vec();
        got.sort_unstable();
        assert_eq!(got, (0..1000u64).filter(|i| i % 4 == 1).collect::<Vec<_>>());
    }

    #[test]
    fn unknown_targets_are_dropped() {
        let outbox = Outbox::new();
        outbox.send(VertexId::new(1), "kept");
        outbox.send(VertexId::new(99), "lost");
        let inbox = outbox.into_inbox(|id| id.get() < 10);
        assert!(inbox.has_messages(VertexId::new(1)));
        assert!(!inbox.has_messages(VertexId::new(99)));
        assert!(inbox.messages(VertexId::new(99)).is_empty());
    }
}
