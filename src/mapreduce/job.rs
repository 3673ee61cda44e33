//! Type-erased map-reduce jobs.
//!
//! [`MapReduce`] has associated types, so jobs of different implementations
//! cannot share a `Vec`. [`MapReduceJob`] is the object-safe face of a job:
//! every `MapReduce` implements it, and the orchestrator keeps a registry of
//! `Box<dyn MapReduceJob>`.

use std::any::{Any, TypeId};
use std::fmt;

use super::{MapReduce, Stage, engine};
use crate::compute_error::ComputeError;
use crate::graph::Vertex;
use crate::memory::{IntoMemoryValue, MemoryKey, MemoryValue};

pub trait MapReduceJob: Send + Sync {
    /// Side-effect key of the job.
    fn side_effect_key(&self) -> &str;

    /// The key declaration registered for the job's result.
    fn result_key(&self) -> MemoryKey;

    /// Short implementation name used in logs and errors.
    fn job_name(&self) -> String;

    /// Identity of the implementing type.
    fn implementation(&self) -> TypeId;

    fn participates(&self, stage: Stage) -> bool;

    /// Runs the full pipeline and finalizes the result.
    fn run(&self, vertices: &[Vertex], partitions: usize) -> Result<MemoryValue, ComputeError>;

    fn clone_job(&self) -> Box<dyn MapReduceJob>;

    fn as_any(&self) -> &dyn Any;
}

impl<J: MapReduce> MapReduceJob for J {
    fn side_effect_key(&self) -> &str {
        MapReduce::memory_key(self)
    }

    fn result_key(&self) -> MemoryKey {
        MemoryKey::new(MapReduce::memory_key(self), <J::Output as IntoMemoryValue>::KIND)
    }

    fn job_name(&self) -> String {
        engine::job_name::<J>()
    }

    fn implementation(&self) -> TypeId {
        TypeId::of::<J>()
    }

    fn participates(&self, stage: Stage) -> bool {
        self.do_stage(stage)
    }

    fn run(&self, vertices: &[Vertex], partitions: usize) -> Result<MemoryValue, ComputeError> {
        let results = engine::execute(self, vertices, partitions)?;
        let output = self
            .finalize(results)
            .map_err(|violation| ComputeError::ProtocolViolation {
                job: engine::job_name::<J>(),
                reason: violation.to_string(),
            })?;
        Ok(output.into_memory_value()?)
    }

    fn clone_job(&self) -> Box<dyn MapReduceJob> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Two jobs are equal iff they share an implementation and a side-effect key.
impl PartialEq for dyn MapReduceJob {
    fn eq(&self, other: &Self) -> bool {
        self.implementation() == other.implementation() && self.side_effect_key() == other.side_effect_key()
    }
}

impl Eq for dyn MapReduceJob {}

impl fmt::Debug for dyn MapReduceJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mapreduce[{}:{}]", self.job_name(), self.side_effect_key())
    }
}

impl Clone for Box<dyn MapReduceJob> {
    fn clone(&self) -> Self {
        self.clone_job()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute_error::{BoxError, ProtocolViolation};
    use crate::graph::VertexId;
    use crate::mapreduce::{KeyValue, MapEmitter};

    #[derive(Clone)]
    struct Ids(&'static str);

    impl MapReduce for Ids {
        type MapKey = u64;
        type MapValue = ();
        type ReduceKey = u64;
        type ReduceValue = ();
        type Output = i64;

        fn memory_key(&self) -> &str {
            self.0
        }
        fn do_stage(&self, stage: Stage) -> bool {
            stage == Stage::Map
        }
        fn map(&self, v: &Vertex, e: &mut MapEmitter<u64, ()>) -> Result<(), BoxError> {
            e.emit(v.id().get(), ());
            Ok(())
        }
        fn lift(&self, pair: KeyValue<u64, ()>) -> Option<KeyValue<u64, ()>> {
            Some(pair)
        }
        fn finalize(&self, r: Vec<KeyValue<u64, ()>>) -> Result<i64, ProtocolViolation> {
            Ok(r.len() as i64)
        }
    }

    #[test]
    fn equality_is_by_implementation_and_key() {
        let a: Box<dyn MapReduceJob> = Box::new(Ids("x"));
        let b: Box<dyn MapReduceJob> = Box::new(Ids("x"));
        let c: Box<dyn MapReduceJob> = Box::new(Ids("y"));
        assert_eq!(&*a, &*b);
        assert_ne!(&*a, &*c);
        assert_eq!(&*a.clone(), &*a);
    }

    #[test]
    fn run_finalizes_into_memory_value() {
        let job: Box<dyn MapReduceJob> = Box::new(Ids("ids"));
        let vs: Vec<_> = (0..4u64).map(|i| Vertex::new(VertexId::new(i))).collect();
        assert_eq!(job.run(&vs, 2).unwrap(), MemoryValue::Integer(4));
        assert_eq!(job.result_key(), MemoryKey::integer("ids"));
        assert!(job.as_any().downcast_ref::<Ids>().is_some());
    }
}
