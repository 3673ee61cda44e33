#![cfg_attr(docsrs, feature(doc_cfg))]
//! # superstep
//!
//! superstep is a bulk-synchronous-parallel (BSP) vertex-program engine in the
//! Pregel style. A [`VertexProgram`](program::VertexProgram) runs once per
//! active vertex per superstep, all vertices in parallel. Programs coordinate
//! through a shared, barrier-synchronized [`Memory`](memory::Memory) and through
//! messages delivered at the next superstep. After the program halts,
//! [`MapReduce`](mapreduce::MapReduce) jobs aggregate the final vertex states
//! into named memory entries.
//!
//! ## Features
//! - Double-buffered memory with per-key locking: reads observe the snapshot
//!   of the previous barrier, writes land in the running superstep's buffer
//! - Barrier enforced by ownership: promotion needs `&mut Memory`, which is
//!   unavailable while vertex tasks hold `&Memory`
//! - Partitioned map, optional combine, ordered shuffle and parallel reduce,
//!   with a per-job multiplicity contract on reduce
//! - Explicit run state machine ([`BspRun`](computer::BspRun)) and a one-shot
//!   builder ([`GraphComputer`](computer::GraphComputer))
//! - Persistable parameters ([`PersistState`](config::PersistState)) for every
//!   built-in program and job
//!
//! ## Determinism
//!
//! Map-reduce keys are shuffled through an ordered map, so for a fixed vertex
//! order a job's result sequence does not depend on partitioning or worker
//! count. The order in which concurrent writers reach a memory key is not
//! defined; `incr`, `and` and `or` are commutative, `set` is last-writer-wins.
//!
//! ## Logging
//! The crate logs through the [`log`] facade and installs no logger.

pub mod algs;
pub mod compute_error;
pub mod computer;
pub mod config;
pub mod graph;
pub mod mapreduce;
pub mod memory;
pub mod program;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::{
        CountMapReduce, GroupCountMapReduce, PageRankMapReduce, PageRankVertexProgram,
    };
    pub use crate::compute_error::{
        BoxError, ComputeError, ConfigError, GraphError, MemoryError, ProtocolViolation,
    };
    pub use crate::computer::{BspRun, ComputerResult, GraphComputer, RunPhase, StepOutcome};
    pub use crate::config::{ComputerConfig, Configuration, PersistState};
    pub use crate::graph::{ComputeGraph, InMemoryGraph, PropertyValue, Vertex, VertexId};
    pub use crate::mapreduce::{
        KeyValue, MapEmitter, MapReduce, MapReduceJob, Multiplicity, ReduceEmitter, Stage,
    };
    pub use crate::memory::{Memory, MemoryKey, MemoryValue, ValueKind};
    pub use crate::program::{NoopProgram, VertexContext, VertexProgram};
}
