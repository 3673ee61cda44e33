#![allow(dead_code)]
use superstep::prelude::*;

pub fn vid(u: u64) -> VertexId {
    VertexId::new(u)
}

/// Directed ring 0 -> 1 -> ... -> n-1 -> 0.
pub fn ring(n: u64) -> InMemoryGraph {
    let edges: Vec<_> = (0..n).map(|i| (i, (i + 1) % n)).collect();
    InMemoryGraph::from_edges(&edges)
}

/// Increments `count` once per active vertex and halts after `supersteps` supersteps.
pub struct CountingProgram {
    pub supersteps: usize,
}

impl VertexProgram for CountingProgram {
    type Message = ();

    fn memory_keys(&self) -> Vec<MemoryKey> {
        vec![MemoryKey::integer("count")]
    }

    fn execute(&self, _v: &mut Vertex, ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
        ctx.memory().incr("count", 1)?;
        Ok(())
    }

    fn terminate(&self, memory: &Memory) -> Result<bool, BoxError> {
        Ok(memory.iteration() + 1 >= self.supersteps)
    }
}

/// Like [`CountingProgram`], but vertex `victim` fails in superstep `at`.
pub struct FailingProgram {
    pub victim: VertexId,
    pub at: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("vertex gave up")]
pub struct GaveUp;

impl VertexProgram for FailingProgram {
    type Message = ();

    fn memory_keys(&self) -> Vec<MemoryKey> {
        vec![MemoryKey::integer("count"), MemoryKey::boolean("touched")]
    }

    fn execute(&self, v: &mut Vertex, ctx: &VertexContext<'_, ()>) -> Result<(), BoxError> {
        ctx.memory().incr("count", 1)?;
        ctx.memory().set("touched", true)?;
        if v.id() == self.victim && ctx.iteration() == self.at {
            return Err(Box::new(GaveUp));
        }
        Ok(())
    }

    fn terminate(&self, _memory: &Memory) -> Result<bool, BoxError> {
        Ok(false)
    }
}

/// Vertices with ids `0..n` and no edges.
pub fn vertices(n: u64) -> Vec<Vertex> {
    (0..n).map(|i| Vertex::new(vid(i))).collect()
}
