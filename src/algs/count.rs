//! Vertex counting job.

use crate::compute_error::{BoxError, ConfigError, ProtocolViolation};
use crate::config::{Configuration, IMPLEMENTATION_KEY, PersistState, check_implementation};
use crate::graph::Vertex;
use crate::mapreduce::{KeyValue, MapEmitter, MapReduce, ReduceEmitter, Stage};

const MEMORY_KEY: &str = "superstep.countMapReduce.memoryKey";
const PROPERTY: &str = "superstep.countMapReduce.property";

/// Counts vertices, optionally only those carrying a given property.
///
/// Every vertex maps to a single partial count under the unit key, so combine
/// and reduce are the same sum and the result is one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMapReduce {
    memory_key: String,
    property: Option<String>,
}

impl CountMapReduce {
    pub const DEFAULT_MEMORY_KEY: &'static str = "count";

    pub fn new() -> Self {
        Self {
            memory_key: Self::DEFAULT_MEMORY_KEY.to_string(),
            property: None,
        }
    }

    pub fn with_memory_key(mut self, key: impl Into<String>) -> Self {
        self.memory_key = key.into();
        self
    }

    /// Only counts vertices that have `property` set.
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    fn sum(values: Vec<i64>, emitter: &mut ReduceEmitter<(), i64>) {
        emitter.emit((), values.into_iter().sum());
    }
}

impl Default for CountMapReduce {
    fn default() -> Self {
        Self::new()
    }
}

impl MapReduce for CountMapReduce {
    type MapKey = ();
    type MapValue = i64;
    type ReduceKey = ();
    type ReduceValue = i64;
    type Output = i64;

    fn memory_key(&self) -> &str {
        &self.memory_key
    }

    fn do_stage(&self, _stage: Stage) -> bool {
        true
    }

    fn map(&self, vertex: &Vertex, emitter: &mut MapEmitter<(), i64>) -> Result<(), BoxError> {
        let counted = match &self.property {
            Some(p) => vertex.property(p).is_some(),
            None => true,
        };
        if counted {
            emitter.emit((), 1);
        }
        Ok(())
    }

    fn combine(
        &self,
        _key: &(),
        values: Vec<i64>,
        emitter: &mut ReduceEmitter<(), i64>,
    ) -> Result<(), BoxError> {
        Self::sum(values, emitter);
        Ok(())
    }

    fn reduce(
        &self,
        _key: (),
        values: Vec<i64>,
        emitter: &mut ReduceEmitter<(), i64>,
    ) -> Result<(), BoxError> {
        Self::sum(values, emitter);
        Ok(())
    }

    /// The single reduced value; 0 when no vertex was counted.
    fn finalize(&self, results: Vec<KeyValue<(), i64>>) -> Result<i64, ProtocolViolation> {
        let mut results = results.into_iter();
        let count = results.next().map_or(0, |kv| kv.value);
        if results.next().is_some() {
            return Err(ProtocolViolation::new("count reduced to more than one value"));
        }
        Ok(count)
    }
}

impl PersistState for CountMapReduce {
    fn store_state(&self, configuration: &mut Configuration) {
        configuration.set_property(IMPLEMENTATION_KEY, "CountMapReduce");
        configuration.set_property(MEMORY_KEY, self.memory_key.as_str());
        match &self.property {
            Some(p) => configuration.set_property(PROPERTY, p.as_str()),
            None => {
                configuration.remove(PROPERTY);
            }
        }
    }

    fn load_state(configuration: &Configuration) -> Result<Self, ConfigError> {
        check_implementation(configuration, "CountMapReduce")?;
        Ok(Self {
            memory_key: configuration
                .get_string_or(MEMORY_KEY, Self::DEFAULT_MEMORY_KEY)?
                .to_string(),
            property: configuration.get_string(PROPERTY)?.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::VertexId;
    use crate::mapreduce::execute;

    fn graph(n: u64) -> Vec<Vertex> {
        (0..n)
            .map(|i| {
                let v = Vertex::new(VertexId::new(i));
                if i % 2 == 0 { v.with_property("even", true) } else { v }
            })
            .collect()
    }

    #[test]
    fn counts_all_or_filtered_vertices() {
        let vs = graph(9);
        let all = CountMapReduce::new();
        let pairs = execute(&all, &vs, 4).unwrap();
        assert_eq!(all.finalize(pairs).unwrap(), 9);

        let even = CountMapReduce::new().with_property("even");
        let pairs = execute(&even, &vs, 3).unwrap();
        assert_eq!(even.finalize(pairs).unwrap(), 5);
    }

    #[test]
    fn empty_graph_counts_zero() {
        let job = CountMapReduce::new();
        let pairs = execute(&job, &[], 2).unwrap();
        assert_eq!(job.finalize(pairs).unwrap(), 0);
    }

    #[test]
    fn state_round_trips() {
        for job in [
            CountMapReduce::new(),
            CountMapReduce::new().with_memory_key("n").with_property("name"),
        ] {
            let mut cfg = Configuration::new();
            job.store_state(&mut cfg);
            assert_eq!(CountMapReduce::load_state(&cfg).unwrap(), job);
        }
    }
}
