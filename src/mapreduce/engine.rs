//! Execution of one map-reduce job over a vertex slice.
//!
//! Vertices are split into contiguous partitions. Each partition maps (and
//! optionally combines) on its own clone of the job in parallel; partitions
//! are then shuffled into one ordered group per key, and groups are reduced
//! in parallel. Keys are ordered (`MapKey: Ord`), so the result sequence is
//! deterministic for a given vertex order regardless of partitioning.

use rayon::prelude::*;
use std::collections::BTreeMap;

use super::{KeyValue, MapEmitter, MapReduce, ReduceEmitter, Stage};
use crate::compute_error::{BoxError, ComputeError, ConfigError};
use crate::graph::Vertex;

type Groups<K, V> = BTreeMap<K, Vec<V>>;

/// Runs MAP, COMBINE (if the job participates) and REDUCE (or the map-only
/// lift) over `vertices` split into `partitions` parts.
///
/// Returns the result pairs in key order; `finalize` is not applied.
pub fn execute<J: MapReduce>(
    job: &J,
    vertices: &[Vertex],
    partitions: usize,
) -> Result<Vec<KeyValue<J::ReduceKey, J::ReduceValue>>, ComputeError> {
    if !job.do_stage(Stage::Map) {
        return Err(ConfigError::InvalidJob {
            job: job_name::<J>(),
            reason: "job does not participate in the map stage".to_string(),
        }
        .into());
    }
    let combine = job.do_stage(Stage::Combine);
    let chunk = vertices.len().div_ceil(partitions.max(1)).max(1);

    let partials: Vec<Groups<J::MapKey, J::MapValue>> = vertices
        .par_chunks(chunk)
        .map(|part| map_partition(job.clone(), part, combine))
        .collect::<Result<_, _>>()?;

    // Shuffle: every value of a key ends up in one group.
    let mut groups: Groups<J::MapKey, J::MapValue> = BTreeMap::new();
    for partial in partials {
        for (key, mut values) in partial {
            groups.entry(key).or_default().append(&mut values);
        }
    }
    log::trace!(
        "{}: {} partitions shuffled into {} keys",
        job_name::<J>(),
        vertices.len().div_ceil(chunk),
        groups.len()
    );

    if job.do_stage(Stage::Reduce) {
        reduce_groups(job, groups)
    } else {
        lift_groups(job, groups)
    }
}

fn map_partition<J: MapReduce>(
    job: J,
    part: &[Vertex],
    combine: bool,
) -> Result<Groups<J::MapKey, J::MapValue>, ComputeError> {
    let mut emitter = MapEmitter::new();
    for vertex in part {
        job.map(vertex, &mut emitter)
            .map_err(|source| stage_error::<J>(Stage::Map, source))?;
    }
    let grouped = group(emitter.into_pairs());
    if !combine {
        return Ok(grouped);
    }
    let mut combined = ReduceEmitter::new();
    for (key, values) in grouped {
        job.combine(&key, values, &mut combined)
            .map_err(|source| stage_error::<J>(Stage::Combine, source))?;
    }
    Ok(group(combined.into_pairs()))
}

fn reduce_groups<J: MapReduce>(
    job: &J,
    groups: Groups<J::MapKey, J::MapValue>,
) -> Result<Vec<KeyValue<J::ReduceKey, J::ReduceValue>>, ComputeError> {
    let multiplicity = job.reduce_multiplicity();
    let groups: Vec<_> = groups.into_iter().collect();
    let reduced: Vec<Vec<_>> = groups
        .into_par_iter()
        .map(|(key, values)| {
            let shown = key.clone();
            let mut emitter = ReduceEmitter::new();
            job.reduce(key, values, &mut emitter)
                .map_err(|source| stage_error::<J>(Stage::Reduce, source))?;
            if !multiplicity.admits(emitter.len()) {
                return Err(ComputeError::ProtocolViolation {
                    job: job_name::<J>(),
                    reason: format!(
                        "reduce for key {shown:?} emitted {} pairs, contract is {multiplicity:?}",
                        emitter.len()
                    ),
                });
            }
            Ok(emitter.into_pairs())
        })
        .collect::<Result<_, _>>()?;
    Ok(reduced.into_iter().flatten().collect())
}

fn lift_groups<J: MapReduce>(
    job: &J,
    groups: Groups<J::MapKey, J::MapValue>,
) -> Result<Vec<KeyValue<J::ReduceKey, J::ReduceValue>>, ComputeError> {
    let mut out = Vec::new();
    for (key, values) in groups {
        for value in values {
            let lifted = job.lift(KeyValue::new(key.clone(), value)).ok_or_else(|| {
                ComputeError::ProtocolViolation {
                    job: job_name::<J>(),
                    reason: "job skips the reduce stage but cannot lift mapped pairs".to_string(),
                }
            })?;
            out.push(lifted);
        }
    }
    Ok(out)
}

fn group<K: Ord, V>(pairs: Vec<KeyValue<K, V>>) -> Groups<K, V> {
    let mut groups: Groups<K, V> = BTreeMap::new();
    for KeyValue { key, value } in pairs {
        groups.entry(key).or_default().push(value);
    }
    groups
}

fn stage_error<J: MapReduce>(stage: Stage, source: BoxError) -> ComputeError {
    ComputeError::MapReduce {
        job: job_name::<J>(),
        stage,
        source,
    }
}

/// Type name of a job without its module path.
pub(crate) fn job_name<J: ?Sized>() -> String {
    let full = std::any::type_name::<J>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
