//! Orchestration of a vertex program and its map-reduce jobs.
//!
//! [`GraphComputer`] is the one-shot builder: pick a graph, a program, any
//! number of jobs and a [`ComputerConfig`], then [`submit`](GraphComputer::submit).
//! [`BspRun`] is the same machinery exposed one superstep at a time, for
//! callers that want to observe memory between barriers.
//!
//! ```no_run
//! use superstep::prelude::*;
//!
//! # fn main() -> Result<(), ComputeError> {
//! let graph = InMemoryGraph::from_edges(&[(0, 1), (1, 2), (2, 0)]);
//! let result = GraphComputer::new(graph)
//!     .program(PageRankVertexProgram::builder().iterations(10).build()?)
//!     .map_reduce(PageRankMapReduce::new())
//!     .submit()?;
//! let ranks = result.memory.get_blob("pageRank")?;
//! # let _ = ranks;
//! # Ok(())
//! # }
//! ```

pub mod run;

pub use run::{BspRun, ComputerResult, RunPhase, StepOutcome};

use crate::compute_error::ComputeError;
use crate::config::ComputerConfig;
use crate::graph::ComputeGraph;
use crate::mapreduce::{MapReduce, MapReduceJob};
use crate::program::{NoopProgram, VertexProgram};

/// Builder for a single BSP run.
pub struct GraphComputer<G, P = NoopProgram> {
    graph: G,
    program: P,
    jobs: Vec<Box<dyn MapReduceJob>>,
    config: ComputerConfig,
}

impl<G: ComputeGraph> GraphComputer<G> {
    /// A computer over `graph` running [`NoopProgram`] with default settings.
    pub fn new(graph: G) -> Self {
        Self {
            graph,
            program: NoopProgram,
            jobs: Vec::new(),
            config: ComputerConfig::default(),
        }
    }
}

impl<G, P> GraphComputer<G, P>
where
    G: ComputeGraph,
    P: VertexProgram,
{
    /// Replaces the vertex program.
    pub fn program<Q: VertexProgram>(self, program: Q) -> GraphComputer<G, Q> {
        GraphComputer {
            graph: self.graph,
            program,
            jobs: self.jobs,
            config: self.config,
        }
    }

    /// Registers a job to run after the program halts.
    pub fn map_reduce<J: MapReduce>(mut self, job: J) -> Self {
        self.jobs.push(Box::new(job));
        self
    }

    /// Registers an already type-erased job.
    pub fn map_reduce_boxed(mut self, job: Box<dyn MapReduceJob>) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn config(mut self, config: ComputerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = Some(workers);
        self
    }

    pub fn partitions(mut self, partitions: usize) -> Self {
        self.config.partitions = Some(partitions);
        self
    }

    pub fn max_supersteps(mut self, limit: usize) -> Self {
        self.config.max_supersteps = Some(limit);
        self
    }

    /// Prepares the run without executing any superstep.
    pub fn start(self) -> Result<BspRun<G, P>, ComputeError> {
        BspRun::new(self.graph, self.program, self.jobs, self.config)
    }

    /// Runs the program to termination, then every job.
    pub fn submit(self) -> Result<ComputerResult<G>, ComputeError> {
        let mut run = self.start()?;
        run.run_to_halt()?;
        run.finish()
    }
}
