//! Vertex programs: the per-vertex compute step of a run.
//!
//! A [`VertexProgram`] is a stateless description of a computation:
//!
//! - the memory keys it reads and writes ([`VertexProgram::memory_keys`]),
//! - an optional [`setup`](VertexProgram::setup) run once before superstep 0,
//! - [`execute`](VertexProgram::execute), called once per active vertex per superstep,
//! - [`terminate`](VertexProgram::terminate), called once per superstep after the barrier.
//!
//! `execute` receives `&mut` access to its own vertex and a [`VertexContext`]
//! through which it reads and writes [`Memory`] and sends messages. It has no
//! way to reach another vertex's state directly.

pub mod messages;

pub use messages::{Inbox, Outbox};

use crate::compute_error::BoxError;
use crate::graph::{Vertex, VertexId};
use crate::memory::{Memory, MemoryKey};

/// A user-supplied per-vertex computation plus its termination predicate.
pub trait VertexProgram: Send + Sync {
    /// Payload exchanged between vertices; `()` for programs that do not message.
    type Message: Send + Sync;

    /// Compute keys this program may write.
    fn memory_keys(&self) -> Vec<MemoryKey> {
        Vec::new()
    }

    /// Initializes memory; writes become readable in superstep 0.
    fn setup(&self, _memory: &Memory) -> Result<(), BoxError> {
        Ok(())
    }

    fn execute(
        &self,
        vertex: &mut Vertex,
        ctx: &VertexContext<'_, Self::Message>,
    ) -> Result<(), BoxError>;

    /// Observes the superstep that just completed; `true` halts the run.
    fn terminate(&self, memory: &Memory) -> Result<bool, BoxError>;
}

/// What a vertex sees while executing.
pub struct VertexContext<'a, M> {
    memory: &'a Memory,
    incoming: &'a [M],
    outbox: &'a Outbox<M>,
}

impl<'a, M> VertexContext<'a, M> {
    pub fn new(memory: &'a Memory, incoming: &'a [M], outbox: &'a Outbox<M>) -> Self {
        Self {
            memory,
            incoming,
            outbox,
        }
    }

    #[inline]
    pub fn memory(&self) -> &'a Memory {
        self.memory
    }

    /// Messages sent to this vertex during the previous superstep.
    #[inline]
    pub fn messages(&self) -> &'a [M] {
        self.incoming
    }

    #[inline]
    pub fn iteration(&self) -> usize {
        self.memory.iteration()
    }

    #[inline]
    pub fn is_initial_iteration(&self) -> bool {
        self.memory.is_initial_iteration()
    }

    /// Sends `message` to `target`; it is delivered next superstep.
    #[inline]
    pub fn send(&self, target: VertexId, message: M) {
        self.outbox.send(target, message);
    }

    /// Sends a copy of `message` to each target.
    pub fn send_all<'t>(&self, targets: impl IntoIterator<Item = &'t VertexId>, message: M)
    where
        M: Clone,
    {
        for &target in targets {
            self.outbox.send(target, message.clone());
        }
    }
}

/// Program that does nothing and halts after its first superstep.
///
/// Used when a run only needs map-reduce jobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopProgram;

impl VertexProgram for NoopProgram {
    type Message = ();

    fn execute(&self, _vertex: &mut Vertex, _ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
        Ok(())
    }

    fn terminate(&self, _memory: &Memory) -> Result<bool, BoxError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_routes_messages_to_outbox() {
        let memory = Memory::new([]).unwrap();
        let outbox = Outbox::new();
        let incoming = [1.0f64, 2.0];
        let ctx = VertexContext::new(&memory, &incoming, &outbox);
        assert_eq!(ctx.messages(), &[1.0, 2.0]);
        assert!(ctx.is_initial_iteration());
        let targets = [VertexId::new(4), VertexId::new(5)];
        ctx.send_all(&targets, 0.5);
        ctx.send(VertexId::new(4), 0.25);
        let inbox = outbox.into_inbox(|_| true);
        assert_eq!(inbox.messages(VertexId::new(4)).len(), 2);
        assert_eq!(inbox.messages(VertexId::new(5)), &[0.5]);
    }
}
