//! In-memory reference graph.

use hashbrown::HashMap;
use itertools::Itertools;

use super::{ComputeGraph, Vertex, VertexId};
use crate::compute_error::GraphError;

/// Vertices kept in insertion order with an id index for lookups.
#[derive(Clone, Debug, Default)]
pub struct InMemoryGraph {
    vertices: Vec<Vertex>,
    index: HashMap<VertexId, usize>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from directed edges `(u, v)`, creating vertices in
    /// order of first appearance.
    pub fn from_edges(edges: &[(u64, u64)]) -> Self {
        let mut g = Self::new();
        for raw in edges.iter().flat_map(|&(u, v)| [u, v]).unique() {
            g.insert_unchecked(Vertex::new(VertexId::new(raw)));
        }
        for &(u, v) in edges {
            let idx = g.index[&VertexId::new(u)];
            g.vertices[idx].push_out_edge(VertexId::new(v));
        }
        g
    }

    /// Builds a graph of `n` isolated vertices with ids `0..n`.
    pub fn with_vertices(n: u64) -> Self {
        let mut g = Self::new();
        for raw in 0..n {
            g.insert_unchecked(Vertex::new(VertexId::new(raw)));
        }
        g
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<&mut Vertex, GraphError> {
        if self.index.contains_key(&vertex.id()) {
            return Err(GraphError::DuplicateVertex(vertex.id()));
        }
        let idx = self.insert_unchecked(vertex);
        Ok(&mut self.vertices[idx])
    }

    /// Adds a directed edge; both endpoints must exist.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) -> Result<(), GraphError> {
        if !self.index.contains_key(&to) {
            return Err(GraphError::MissingVertex(to));
        }
        let idx = *self
            .index
            .get(&from)
            .ok_or(GraphError::MissingVertex(from))?;
        self.vertices[idx].push_out_edge(to);
        Ok(())
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.index.get(&id).map(|&i| &self.vertices[i])
    }

    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.index.get(&id).map(|&i| &mut self.vertices[i])
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.vertices.iter().map(Vertex::out_degree).sum()
    }

    fn insert_unchecked(&mut self, vertex: Vertex) -> usize {
        let idx = self.vertices.len();
        self.index.insert(vertex.id(), idx);
        self.vertices.push(vertex);
        idx
    }
}

impl ComputeGraph for InMemoryGraph {
    fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    fn contains_vertex(&self, id: VertexId) -> bool {
        self.index.contains_key(&id)
    }
}
