//! Error types for superstep public APIs.
//!
//! Errors are split by where they can arise:
//! - [`MemoryError`]: local to a single [`Memory`](crate::memory::Memory) call.
//! - [`ConfigError`]: raised before a run starts (keys, parameters, job registry).
//! - [`GraphError`]: building the reference [`InMemoryGraph`](crate::graph::InMemoryGraph).
//! - [`ComputeError`]: anything that aborts a run, wrapping the others.
//!
//! User callbacks (vertex programs, map-reduce stages) return [`BoxError`], so a
//! `MemoryError` can be propagated from inside `execute` with `?`.

use crate::graph::VertexId;
use crate::mapreduce::Stage;
use crate::memory::ValueKind;
use thiserror::Error;

/// Error type returned by user-supplied callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Violations of the [`Memory`](crate::memory::Memory) access contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The key was not declared as a compute key for this run.
    #[error("`{0}` is not a declared memory compute key")]
    UnrecognizedKey(String),
    /// Memory has been completed; mutation is no longer possible.
    #[error("memory is complete and immutable (attempted to mutate `{0}`)")]
    ImmutableMemory(String),
    /// No value exists for the key in the readable snapshot.
    #[error("memory key `{0}` has no value in the previous superstep")]
    KeyNotFound(String),
    /// The value kind does not match the kind declared for the key.
    #[error("memory key `{key}` accepts {expected} values, got {found}")]
    UnsupportedValueType {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },
    /// Encoding or decoding a structural blob failed.
    #[error("memory blob codec failure: {0}")]
    Codec(String),
}

/// Configuration problems detected before any superstep runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A memory key is malformed.
    #[error("invalid memory key `{key}`: {reason}")]
    InvalidMemoryKey { key: String, reason: &'static str },
    /// A memory key was declared more than once.
    #[error("memory key `{0}` is declared more than once")]
    DuplicateMemoryKey(String),
    /// A map-reduce job cannot be scheduled as configured.
    #[error("invalid map-reduce job `{job}`: {reason}")]
    InvalidJob { job: String, reason: String },
    /// A required parameter is absent from a configuration record.
    #[error("missing required parameter `{0}`")]
    MissingParameter(String),
    /// A parameter is present but unusable.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },
    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// Errors from building the reference graph.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("vertex {0} already exists")]
    DuplicateVertex(VertexId),
    #[error("vertex {0} does not exist")]
    MissingVertex(VertexId),
}

/// Any failure that aborts a run.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    /// The vertex program's setup hook failed.
    #[error("vertex program setup failed: {source}")]
    Setup { source: BoxError },
    /// `execute` failed for a vertex; the superstep was discarded.
    #[error("vertex {vertex} failed in superstep {superstep}: {source}")]
    Vertex {
        vertex: VertexId,
        superstep: usize,
        source: BoxError,
    },
    /// The termination predicate failed.
    #[error("termination check failed after superstep {superstep}: {source}")]
    Terminate { superstep: usize, source: BoxError },
    /// A map-reduce stage callback failed.
    #[error("map-reduce job `{job}` failed in the {stage} stage: {source}")]
    MapReduce {
        job: String,
        stage: Stage,
        source: BoxError,
    },
    /// A job's emissions contradict its own contract.
    #[error("map-reduce job `{job}` violated its emission contract: {reason}")]
    ProtocolViolation { job: String, reason: String },
    /// The configured superstep cap was reached before termination.
    #[error("superstep limit of {0} reached without termination")]
    SuperstepLimit(usize),
    /// An operation was invoked in the wrong run phase.
    #[error("`{operation}` is not allowed while the run is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: crate::computer::RunPhase,
    },
}

/// Raised by a job's `finalize` when its inputs do not have the expected shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProtocolViolation(pub String);

impl ProtocolViolation {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
