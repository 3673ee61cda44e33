//! Per-value vertex counting job.

use crate::compute_error::{BoxError, ConfigError, ProtocolViolation};
use crate::config::{Configuration, IMPLEMENTATION_KEY, PersistState, check_implementation};
use crate::graph::Vertex;
use crate::mapreduce::{KeyValue, MapEmitter, MapReduce, ReduceEmitter, Stage};

const MEMORY_KEY: &str = "superstep.groupCountMapReduce.memoryKey";
const PROPERTY: &str = "superstep.groupCountMapReduce.property";

/// Counts vertices per distinct value of a property.
///
/// Values are grouped by their display form, so `1` and `"1"` fall into the
/// same group. Vertices without the property are skipped. The result is a
/// blob of `Vec<KeyValue<String, i64>>` sorted by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCountMapReduce {
    memory_key: String,
    property: String,
}

impl GroupCountMapReduce {
    pub const DEFAULT_MEMORY_KEY: &'static str = "groupCount";

    pub fn new(property: impl Into<String>) -> Self {
        Self {
            memory_key: Self::DEFAULT_MEMORY_KEY.to_string(),
            property: property.into(),
        }
    }

    pub fn with_memory_key(mut self, key: impl Into<String>) -> Self {
        self.memory_key = key.into();
        self
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

impl MapReduce for GroupCountMapReduce {
    type MapKey = String;
    type MapValue = i64;
    type ReduceKey = String;
    type ReduceValue = i64;
    type Output = Vec<KeyValue<String, i64>>;

    fn memory_key(&self) -> &str {
        &self.memory_key
    }

    fn do_stage(&self, _stage: Stage) -> bool {
        true
    }

    fn map(&self, vertex: &Vertex, emitter: &mut MapEmitter<String, i64>) -> Result<(), BoxError> {
        if let Some(value) = vertex.property(&self.property) {
            emitter.emit(value.to_string(), 1);
        }
        Ok(())
    }

    fn combine(
        &self,
        key: &String,
        values: Vec<i64>,
        emitter: &mut ReduceEmitter<String, i64>,
    ) -> Result<(), BoxError> {
        emitter.emit(key.clone(), values.into_iter().sum());
        Ok(())
    }

    fn reduce(
        &self,
        key: String,
        values: Vec<i64>,
        emitter: &mut ReduceEmitter<String, i64>,
    ) -> Result<(), BoxError> {
        emitter.emit(key, values.into_iter().sum());
        Ok(())
    }

    fn finalize(
        &self,
        results: Vec<KeyValue<String, i64>>,
    ) -> Result<Self::Output, ProtocolViolation> {
        Ok(results)
    }
}

impl PersistState for GroupCountMapReduce {
    fn store_state(&self, configuration: &mut Configuration) {
        configuration.set_property(IMPLEMENTATION_KEY, "GroupCountMapReduce");
        configuration.set_property(MEMORY_KEY, self.memory_key.as_str());
        configuration.set_property(PROPERTY, self.property.as_str());
    }

    fn load_state(configuration: &Configuration) -> Result<Self, ConfigError> {
        check_implementation(configuration, "GroupCountMapReduce")?;
        Ok(Self::new(configuration.require_string(PROPERTY)?).with_memory_key(
            configuration.get_string_or(MEMORY_KEY, Self::DEFAULT_MEMORY_KEY)?,
        ))
    }
}
