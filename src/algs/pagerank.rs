//! PageRank as a vertex program plus the job that collects its ranks.
//!
//! Superstep 0 seeds every vertex with `1 / vertex_count`. Every later
//! superstep sets
//!
//! ```text
//! rank(v) = alpha * Σ incoming + (1 - alpha) / vertex_count
//! ```
//!
//! and each vertex spreads its rank evenly over its out-edges. The program
//! halts after `total_iterations` supersteps. `vertex_count` is the
//! normalization constant, not a measured size: with the default `1.0`
//! ranks are unnormalized and a vertex with no in-links settles at
//! `1 - alpha`.

use crate::compute_error::{BoxError, ConfigError, ProtocolViolation};
use crate::config::{Configuration, IMPLEMENTATION_KEY, PersistState, check_implementation};
use crate::graph::{Vertex, VertexId};
use crate::mapreduce::{KeyValue, MapEmitter, MapReduce, Stage};
use crate::memory::Memory;
use crate::program::{VertexContext, VertexProgram};

/// Vertex property holding the rank.
pub const PAGE_RANK: &str = "pageRank";

const ALPHA: &str = "superstep.pageRankVertexProgram.alpha";
const TOTAL_ITERATIONS: &str = "superstep.pageRankVertexProgram.totalIterations";
const VERTEX_COUNT: &str = "superstep.pageRankVertexProgram.vertexCount";

#[derive(Debug, Clone, PartialEq)]
pub struct PageRankVertexProgram {
    alpha: f64,
    total_iterations: usize,
    vertex_count: f64,
}

impl PageRankVertexProgram {
    pub const DEFAULT_ALPHA: f64 = 0.85;
    pub const DEFAULT_TOTAL_ITERATIONS: usize = 30;
    pub const DEFAULT_VERTEX_COUNT: f64 = 1.0;

    pub fn builder() -> PageRankBuilder {
        PageRankBuilder::default()
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[inline]
    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }

    #[inline]
    pub fn vertex_count(&self) -> f64 {
        self.vertex_count
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(invalid(ALPHA, format!("alpha must lie in (0, 1], got {}", self.alpha)));
        }
        if self.total_iterations == 0 {
            return Err(invalid(TOTAL_ITERATIONS, "at least one iteration is required".into()));
        }
        if !(self.vertex_count > 0.0 && self.vertex_count.is_finite()) {
            return Err(invalid(
                VERTEX_COUNT,
                format!("vertex count must be positive, got {}", self.vertex_count),
            ));
        }
        Ok(self)
    }
}

impl Default for PageRankVertexProgram {
    fn default() -> Self {
        Self {
            alpha: Self::DEFAULT_ALPHA,
            total_iterations: Self::DEFAULT_TOTAL_ITERATIONS,
            vertex_count: Self::DEFAULT_VERTEX_COUNT,
        }
    }
}

fn invalid(name: &str, reason: String) -> ConfigError {
    ConfigError::InvalidParameter {
        name: name.to_string(),
        reason,
    }
}

/// Builder for [`PageRankVertexProgram`].
#[derive(Debug, Clone, Default)]
pub struct PageRankBuilder {
    alpha: Option<f64>,
    total_iterations: Option<usize>,
    vertex_count: Option<f64>,
}

impl PageRankBuilder {
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    /// Number of supersteps to run.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.total_iterations = Some(iterations);
        self
    }

    pub fn vertex_count(mut self, count: f64) -> Self {
        self.vertex_count = Some(count);
        self
    }

    pub fn build(self) -> Result<PageRankVertexProgram, ConfigError> {
        let d = PageRankVertexProgram::default();
        PageRankVertexProgram {
            alpha: self.alpha.unwrap_or(d.alpha),
            total_iterations: self.total_iterations.unwrap_or(d.total_iterations),
            vertex_count: self.vertex_count.unwrap_or(d.vertex_count),
        }
        .validate()
    }
}

impl VertexProgram for PageRankVertexProgram {
    type Message = f64;

    fn execute(&self, vertex: &mut Vertex, ctx: &VertexContext<'_, f64>) -> Result<(), BoxError> {
        let rank = if ctx.is_initial_iteration() {
            1.0 / self.vertex_count
        } else {
            let incoming: f64 = ctx.messages().iter().sum();
            self.alpha * incoming + (1.0 - self.alpha) / self.vertex_count
        };
        vertex.set_property(PAGE_RANK, rank);
        let degree = vertex.out_degree();
        if degree > 0 {
            ctx.send_all(vertex.out_edges(), rank / degree as f64);
        }
        Ok(())
    }

    fn terminate(&self, memory: &Memory) -> Result<bool, BoxError> {
        Ok(memory.iteration() + 1 >= self.total_iterations)
    }
}

impl PersistState for PageRankVertexProgram {
    fn store_state(&self, configuration: &mut Configuration) {
        configuration.set_property(IMPLEMENTATION_KEY, "PageRankVertexProgram");
        configuration.set_property(ALPHA, self.alpha);
        configuration.set_property(TOTAL_ITERATIONS, self.total_iterations as i64);
        configuration.set_property(VERTEX_COUNT, self.vertex_count);
    }

    fn load_state(configuration: &Configuration) -> Result<Self, ConfigError> {
        check_implementation(configuration, "PageRankVertexProgram")?;
        Self {
            alpha: configuration.get_f64_or(ALPHA, Self::DEFAULT_ALPHA)?,
            total_iterations: configuration
                .get_usize_or(TOTAL_ITERATIONS, Self::DEFAULT_TOTAL_ITERATIONS)?,
            vertex_count: configuration.get_f64_or(VERTEX_COUNT, Self::DEFAULT_VERTEX_COUNT)?,
        }
        .validate()
    }
}

const MEMORY_KEY: &str = "superstep.pageRankMapReduce.memoryKey";

/// Map-only job collecting `(vertex, rank)` for every ranked vertex.
///
/// The result is a blob of `Vec<KeyValue<VertexId, f64>>` in vertex order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRankMapReduce {
    memory_key: String,
}

impl PageRankMapReduce {
    pub const DEFAULT_MEMORY_KEY: &'static str = "pageRank";

    pub fn new() -> Self {
        Self::with_memory_key(Self::DEFAULT_MEMORY_KEY)
    }

    pub fn with_memory_key(key: impl Into<String>) -> Self {
        Self {
            memory_key: key.into(),
        }
    }
}

impl Default for PageRankMapReduce {
    fn default() -> Self {
        Self::new()
    }
}

impl MapReduce for PageRankMapReduce {
    type MapKey = VertexId;
    type MapValue = f64;
    type ReduceKey = VertexId;
    type ReduceValue = f64;
    type Output = Vec<KeyValue<VertexId, f64>>;

    fn memory_key(&self) -> &str {
        &self.memory_key
    }

    fn do_stage(&self, stage: Stage) -> bool {
        stage == Stage::Map
    }

    fn map(&self, vertex: &Vertex, emitter: &mut MapEmitter<VertexId, f64>) -> Result<(), BoxError> {
        if let Some(rank) = vertex.property(PAGE_RANK).and_then(|p| p.as_f64()) {
            emitter.emit(vertex.id(), rank);
        }
        Ok(())
    }

    fn lift(&self, pair: KeyValue<VertexId, f64>) -> Option<KeyValue<VertexId, f64>> {
        Some(pair)
    }

    fn finalize(
        &self,
        results: Vec<KeyValue<VertexId, f64>>,
    ) -> Result<Self::Output, ProtocolViolation> {
        Ok(results)
    }
}

impl PersistState for PageRankMapReduce {
    fn store_state(&self, configuration: &mut Configuration) {
        configuration.set_property(IMPLEMENTATION_KEY, "PageRankMapReduce");
        configuration.set_property(MEMORY_KEY, self.memory_key.as_str());
    }

    fn load_state(configuration: &Configuration) -> Result<Self, ConfigError> {
        check_implementation(configuration, "PageRankMapReduce")?;
        Ok(Self::with_memory_key(
            configuration.get_string_or(MEMORY_KEY, Self::DEFAULT_MEMORY_KEY)?,
        ))
    }
}
