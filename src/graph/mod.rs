//! Graph collaborator: the vertex storage a run executes over.
//!
//! The engine does not own a storage format. It needs exactly three things
//! from the host graph:
//! - iteration over the vertex set (shared for map-reduce, mutable for supersteps),
//! - per-vertex local property get/set (see [`Vertex`]),
//! - a vote-to-halt flag per vertex deciding the active set.
//!
//! [`ComputeGraph`] captures that contract; [`InMemoryGraph`] is the reference
//! implementation used by tests, benches and small hosts.

pub mod in_memory;
pub mod vertex;

pub use in_memory::InMemoryGraph;
pub use vertex::{PropertyValue, Vertex};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque vertex identifier.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct VertexId(u64);

impl VertexId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        VertexId(raw)
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VertexId").field(&self.0).finish()
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VertexId {
    fn from(raw: u64) -> Self {
        VertexId(raw)
    }
}

/// Vertex storage driven by a run.
///
/// Implementors hand out their vertices as slices so the engine can split
/// them across worker threads; each task gets `&mut` to exactly one vertex,
/// which is what keeps vertex executions from touching each other's state.
pub trait ComputeGraph: Send + Sync {
    /// All vertices, in a stable order.
    fn vertices(&self) -> &[Vertex];

    /// All vertices, mutably, in the same order as [`ComputeGraph::vertices`].
    fn vertices_mut(&mut self) -> &mut [Vertex];

    /// Whether `id` names a vertex of this graph.
    ///
    /// Called once per message target at every barrier, so implementors should
    /// answer from an index rather than scanning [`ComputeGraph::vertices`].
    fn contains_vertex(&self, id: VertexId) -> bool;

    fn vertex_count(&self) -> usize {
        self.vertices().len()
    }
}
