//! MapReduce: staged aggregation over the final vertex state of a run.
//!
//! A job runs up to three stages:
//!
//! 1. **MAP**: every vertex emits zero or more key/value pairs.
//! 2. **COMBINE** (optional): per map partition, before the shuffle, values of
//!    one key are pre-aggregated. Combining must be interchangeable with a local
//!    reduce: it may run over any sub-partition of the vertices, any number of
//!    times, without changing the final output.
//! 3. **REDUCE**: all values of one key, across every partition, meet in a
//!    single reduce call.
//!
//! The job's `finalize` then turns the result pairs into one value, stored in
//! [`Memory`](crate::memory::Memory) under the job's side-effect key.

pub mod engine;
pub mod job;

pub use engine::execute;
pub use job::MapReduceJob;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::compute_error::{BoxError, ProtocolViolation};
use crate::graph::Vertex;
use crate::memory::IntoMemoryValue;

/// A map-reduce stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Map,
    Combine,
    Reduce,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Map => "map",
            Stage::Combine => "combine",
            Stage::Reduce => "reduce",
        })
    }
}

/// How many pairs a single reduce call may emit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Multiplicity {
    #[default]
    ExactlyOne,
    AtMostOne,
    Any,
}

impl Multiplicity {
    #[inline]
    pub fn admits(self, emitted: usize) -> bool {
        match self {
            Multiplicity::ExactlyOne => emitted == 1,
            Multiplicity::AtMostOne => emitted <= 1,
            Multiplicity::Any => true,
        }
    }
}

/// One emitted key/value pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyValue<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> KeyValue<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

/// Collects the pairs emitted by a stage callback.
#[derive(Debug)]
pub struct Emitter<K, V> {
    pairs: Vec<KeyValue<K, V>>,
}

impl<K, V> Emitter<K, V> {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    #[inline]
    pub fn emit(&mut self, key: K, value: V) {
        self.pairs.push(KeyValue::new(key, value));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn into_pairs(self) -> Vec<KeyValue<K, V>> {
        self.pairs
    }
}

impl<K, V> Default for Emitter<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Emitter handed to [`MapReduce::map`].
pub type MapEmitter<K, V> = Emitter<K, V>;
/// Emitter handed to [`MapReduce::combine`] and [`MapReduce::reduce`].
pub type ReduceEmitter<K, V> = Emitter<K, V>;

/// A map-reduce job.
///
/// Jobs are cloned once per map partition, so any internal state is private
/// to the partition that owns the clone. Equality between registered jobs is
/// decided by implementation type and [`MapReduce::memory_key`]; see
/// [`MapReduceJob`].
pub trait MapReduce: Clone + Send + Sync + 'static {
    type MapKey: Ord + Clone + fmt::Debug + Send + Sync;
    type MapValue: Send + Sync;
    type ReduceKey: Send + Sync;
    type ReduceValue: Send + Sync;
    type Output: IntoMemoryValue;

    /// Side-effect key the final result is stored under.
    fn memory_key(&self) -> &str;

    /// Whether this job participates in `stage`. MAP is mandatory.
    fn do_stage(&self, stage: Stage) -> bool;

    fn map(
        &self,
        vertex: &Vertex,
        emitter: &mut MapEmitter<Self::MapKey, Self::MapValue>,
    ) -> Result<(), BoxError>;

    /// Pre-aggregates the values of `key` seen in one partition.
    ///
    /// The default re-emits every value unchanged.
    fn combine(
        &self,
        key: &Self::MapKey,
        values: Vec<Self::MapValue>,
        emitter: &mut ReduceEmitter<Self::MapKey, Self::MapValue>,
    ) -> Result<(), BoxError> {
        for value in values {
            emitter.emit(key.clone(), value);
        }
        Ok(())
    }

    /// Aggregates every value of `key`.
    fn reduce(
        &self,
        _key: Self::MapKey,
        _values: Vec<Self::MapValue>,
        _emitter: &mut ReduceEmitter<Self::ReduceKey, Self::ReduceValue>,
    ) -> Result<(), BoxError> {
        Err(format!("{} does not implement reduce", std::any::type_name::<Self>()).into())
    }

    /// Emission contract of one reduce call.
    fn reduce_multiplicity(&self) -> Multiplicity {
        Multiplicity::ExactlyOne
    }

    /// Moves a mapped pair into the result space. Only used by jobs that
    /// skip [`Stage::Reduce`]; `None` means the job cannot be map-only.
    fn lift(
        &self,
        _pair: KeyValue<Self::MapKey, Self::MapValue>,
    ) -> Option<KeyValue<Self::ReduceKey, Self::ReduceValue>> {
        None
    }

    /// Materializes the job's result from every result pair.
    fn finalize(
        &self,
        results: Vec<KeyValue<Self::ReduceKey, Self::ReduceValue>>,
    ) -> Result<Self::Output, ProtocolViolation>;
}
