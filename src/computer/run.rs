//! `BspRun`: the superstep state machine of one run.
//!
//! ```text
//!  new()                 step() ...                          finish()
//!  INIT ──► EXECUTE ──► BARRIER ──► TERMINATE-CHECK ──► HALTED ──► map-reduce
//!              ▲                         │ false
//!              └─────────────────────────┘
//! ```
//!
//! - `new` validates keys, builds [`Memory`] and the worker pool, and runs the
//!   program's setup.
//! - `step` runs one superstep. Every active vertex executes in parallel on the
//!   pool; the pool join is the barrier. Only after the join does memory get
//!   promoted and the termination predicate run.
//! - `finish` runs each registered job in registration order and stores its
//!   result in memory.
//!
//! A failure in any superstep rolls back that superstep's memory and vertex writes,
//! discards its messages, leaves the run in [`RunPhase::Failed`], and keeps
//! memory and graph inspectable.

use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::compute_error::{ComputeError, ConfigError};
use crate::config::ComputerConfig;
use crate::graph::{ComputeGraph, Vertex};
use crate::mapreduce::{MapReduceJob, Stage};
use crate::memory::Memory;
use crate::program::{Inbox, Outbox, VertexContext, VertexProgram};

/// Phase of a [`BspRun`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunPhase {
    /// Supersteps are being executed.
    Execute,
    /// The program terminated; memory is complete.
    Halted,
    /// A superstep, termination check or limit aborted the run.
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunPhase::Execute => "executing",
            RunPhase::Halted => "halted",
            RunPhase::Failed => "failed",
        })
    }
}

/// Outcome of one [`BspRun::step`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Halted,
}

/// Result of a finished run: the completed memory and the mutated graph.
#[derive(Debug)]
pub struct ComputerResult<G> {
    pub memory: Memory,
    pub graph: G,
}

impl<G> ComputerResult<G> {
    pub fn into_parts(self) -> (Memory, G) {
        (self.memory, self.graph)
    }
}

pub struct BspRun<G, P: VertexProgram> {
    graph: G,
    program: P,
    jobs: Vec<Box<dyn MapReduceJob>>,
    memory: Memory,
    inbox: Inbox<P::Message>,
    pool: rayon::ThreadPool,
    config: ComputerConfig,
    phase: RunPhase,
    started: Instant,
}

impl<G, P> BspRun<G, P>
where
    G: ComputeGraph,
    P: VertexProgram,
{
    /// INIT: validates configuration, builds memory and runs `setup`.
    ///
    /// Jobs equal to an earlier job are dropped; distinct jobs sharing a
    /// side-effect key, or a job key colliding with a program key, fail.
    pub fn new(
        graph: G,
        program: P,
        jobs: Vec<Box<dyn MapReduceJob>>,
        config: ComputerConfig,
    ) -> Result<Self, ComputeError> {
        let jobs = dedup_jobs(jobs);
        for job in &jobs {
            if !job.participates(Stage::Map) {
                return Err(ConfigError::InvalidJob {
                    job: job.job_name(),
                    reason: "job does not participate in the map stage".to_string(),
                }
                .into());
            }
        }
        if config.partitions == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "partitions".to_string(),
                reason: "at least one partition is required".to_string(),
            }
            .into());
        }

        let mut memory = Memory::new(program.memory_keys())?;
        for job in &jobs {
            memory.register_result_key(job.result_key())?;
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers.unwrap_or(0))
            .thread_name(|i| format!("superstep-worker-{i}"))
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;

        program
            .setup(&memory)
            .map_err(|source| ComputeError::Setup { source })?;
        memory.complete_superstep();

        log::info!(
            "starting {} over {} vertices with {} map-reduce job(s) on {} worker(s)",
            std::any::type_name::<P>(),
            graph.vertex_count(),
            jobs.len(),
            pool.current_num_threads()
        );

        Ok(Self {
            graph,
            program,
            jobs,
            memory,
            inbox: Inbox::empty(),
            pool,
            config,
            phase: RunPhase::Execute,
            started: Instant::now(),
        })
    }

    #[inline]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    #[inline]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    #[inline]
    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn program(&self) -> &P {
        &self.program
    }

    /// Registered jobs after deduplication, in registration order.
    pub fn jobs(&self) -> &[Box<dyn MapReduceJob>] {
        &self.jobs
    }

    /// Runs one superstep: EXECUTE, BARRIER, TERMINATE-CHECK.
    pub fn step(&mut self) -> Result<StepOutcome, ComputeError> {
        if self.phase != RunPhase::Execute {
            return Err(ComputeError::InvalidPhase {
                operation: "step",
                phase: self.phase,
            });
        }
        let superstep = self.memory.iteration();
        let outbox = Outbox::new();
        let active = AtomicUsize::new(0);
        // Vertex state at the start of the superstep, restored if it aborts.
        let snapshot: Vec<Vertex> = self.graph.vertices().to_vec();

        let executed = {
            let Self {
                graph,
                program,
                memory,
                inbox,
                pool,
                ..
            } = self;
            let (memory, inbox, program) = (&*memory, &*inbox, &*program);
            let (outbox, active) = (&outbox, &active);
            pool.install(|| {
                graph.vertices_mut().par_iter_mut().try_for_each(|vertex| {
                    let id = vertex.id();
                    if inbox.has_messages(id) {
                        vertex.activate();
                    }
                    if vertex.is_halted() {
                        return Ok(());
                    }
                    active.fetch_add(1, Ordering::Relaxed);
                    let ctx = VertexContext::new(memory, inbox.messages(id), outbox);
                    program
                        .execute(vertex, &ctx)
                        .map_err(|source| ComputeError::Vertex {
                            vertex: id,
                            superstep,
                            source,
                        })
                })
            })
        };

        if let Err(err) = executed {
            self.memory.rollback_superstep();
            self.graph.vertices_mut().clone_from_slice(&snapshot);
            self.phase = RunPhase::Failed;
            log::warn!("superstep {superstep} aborted: {err}");
            return Err(err);
        }

        // Barrier passed: this superstep's writes and messages become visible.
        self.memory.complete_superstep();
        let graph = &self.graph;
        self.inbox = outbox.into_inbox(|id| graph.contains_vertex(id));
        log::debug!(
            "superstep {superstep}: {} active vertices, {} messages in flight",
            active.load(Ordering::Relaxed),
            self.inbox.len()
        );

        let halt = match self.program.terminate(&self.memory) {
            Ok(halt) => halt,
            Err(source) => {
                self.phase = RunPhase::Failed;
                return Err(ComputeError::Terminate { superstep, source });
            }
        };
        self.memory.incr_iteration();

        if halt {
            self.memory.set_runtime(self.started.elapsed())?;
            self.memory.complete();
            self.phase = RunPhase::Halted;
            log::info!(
                "halted after {} superstep(s) in {:?}",
                superstep + 1,
                self.memory.runtime()
            );
            return Ok(StepOutcome::Halted);
        }
        if let Some(limit) = self.config.max_supersteps {
            if self.memory.iteration() >= limit {
                self.phase = RunPhase::Failed;
                return Err(ComputeError::SuperstepLimit(limit));
            }
        }
        Ok(StepOutcome::Continue)
    }

    /// Steps until the program halts.
    pub fn run_to_halt(&mut self) -> Result<(), ComputeError> {
        while self.step()? == StepOutcome::Continue {}
        Ok(())
    }

    /// HALTED: runs every job over the final vertex set and assembles the result.
    pub fn finish(self) -> Result<ComputerResult<G>, ComputeError> {
        if self.phase != RunPhase::Halted {
            return Err(ComputeError::InvalidPhase {
                operation: "finish",
                phase: self.phase,
            });
        }
        let Self {
            graph,
            jobs,
            mut memory,
            pool,
            config,
            ..
        } = self;
        let partitions = config
            .partitions
            .unwrap_or_else(|| pool.current_num_threads())
            .max(1);
        for job in &jobs {
            let value = pool.install(|| job.run(graph.vertices(), partitions))?;
            log::debug!(
                "{:?} finished over {partitions} partition(s): {value}",
                job
            );
            memory.store_result(job.side_effect_key(), value)?;
        }
        Ok(ComputerResult { memory, graph })
    }
}

/// Keeps the first of every group of equal jobs.
fn dedup_jobs(jobs: Vec<Box<dyn MapReduceJob>>) -> Vec<Box<dyn MapReduceJob>> {
    let mut kept: Vec<Box<dyn MapReduceJob>> = Vec::with_capacity(jobs.len());
    for job in jobs {
        if kept.iter().any(|k| **k == *job) {
            log::warn!("ignoring duplicate registration of {:?}", job);
            continue;
        }
        kept.push(job);
    }
    kept
}
