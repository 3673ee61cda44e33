//! Memory: barrier-synchronized, double-buffered global state.
//!
//! Every vertex of a run sees the same [`Memory`]. It holds two buffers:
//!
//! - `previous`: the snapshot produced by the last barrier. All reads
//!   ([`Memory::get`] and friends) go here, so a superstep only ever observes
//!   writes made *before* it started.
//! - `current`: the buffer written during the running superstep. Each key owns
//!   its own lock, so concurrent writers to the same key serialize while
//!   writers to different keys never contend.
//!
//! Mutators take `&self` and may be called from any number of vertex tasks.
//! Promotion ([`Memory::complete_superstep`]) and freezing ([`Memory::complete`])
//! take `&mut self`, which is only obtainable once every task of the superstep
//! has joined. The barrier is therefore enforced by the borrow checker.
//!
//! # Return values of the combining mutators
//! [`Memory::incr`], [`Memory::and`] and [`Memory::or`] fold their operand into
//! `current`, but *return* the `previous` value combined with this call's
//! operand only. Two `incr(k, 1)` calls in one superstep both return
//! `previous + 1`; after the barrier `get(k)` is `previous + 2`.

pub mod key;
pub mod value;

pub use key::{MemoryKey, validate_key};
pub use value::{IntoMemoryValue, MemoryValue, ValueKind};

use bytes::Bytes;
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

use crate::compute_error::{ConfigError, MemoryError};

/// Whether a key may be written by vertex programs or only receives a job result.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum KeyRole {
    Compute,
    Result,
}

#[derive(Debug)]
struct Slot {
    kind: ValueKind,
    role: KeyRole,
    cell: Mutex<Option<MemoryValue>>,
}

impl Slot {
    fn new(kind: ValueKind, role: KeyRole) -> Self {
        Self {
            kind,
            role,
            cell: Mutex::new(None),
        }
    }
}

/// Shared global state of a run.
#[derive(Debug)]
pub struct Memory {
    current: HashMap<String, Slot>,
    previous: HashMap<String, MemoryValue>,
    iteration: usize,
    runtime: Duration,
    complete: bool,
}

impl Memory {
    /// Creates memory accepting exactly the given compute keys.
    ///
    /// Fails with [`ConfigError::InvalidMemoryKey`] for malformed names and
    /// [`ConfigError::DuplicateMemoryKey`] if a name appears twice.
    pub fn new(keys: impl IntoIterator<Item = MemoryKey>) -> Result<Self, ConfigError> {
        let mut memory = Self {
            current: HashMap::new(),
            previous: HashMap::new(),
            iteration: 0,
            runtime: Duration::ZERO,
            complete: false,
        };
        for key in keys {
            memory.declare(key, KeyRole::Compute)?;
        }
        Ok(memory)
    }

    /// Registers the side-effect key of a map-reduce job.
    ///
    /// Result keys are readable like any other key but are never writable
    /// through the mutators; only the run's finalization stores into them.
    pub fn register_result_key(&mut self, key: MemoryKey) -> Result<(), ConfigError> {
        self.declare(key, KeyRole::Result)
    }

    fn declare(&mut self, key: MemoryKey, role: KeyRole) -> Result<(), ConfigError> {
        validate_key(key.name())?;
        if self.current.contains_key(key.name()) {
            return Err(ConfigError::DuplicateMemoryKey(key.name().to_string()));
        }
        let kind = key.kind();
        self.current.insert(key.name().to_string(), Slot::new(kind, role));
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Reads (previous snapshot)
    // ---------------------------------------------------------------------

    /// Returns the value visible in this superstep.
    pub fn get(&self, key: &str) -> Result<&MemoryValue, MemoryError> {
        self.previous
            .get(key)
            .ok_or_else(|| MemoryError::KeyNotFound(key.to_string()))
    }

    pub fn get_integer(&self, key: &str) -> Result<i64, MemoryError> {
        let value = self.get(key)?;
        value
            .as_integer()
            .ok_or_else(|| mismatch(key, ValueKind::Integer, value.kind()))
    }

    pub fn get_boolean(&self, key: &str) -> Result<bool, MemoryError> {
        let value = self.get(key)?;
        value
            .as_boolean()
            .ok_or_else(|| mismatch(key, ValueKind::Boolean, value.kind()))
    }

    pub fn get_blob(&self, key: &str) -> Result<&Bytes, MemoryError> {
        let value = self.get(key)?;
        value
            .as_blob()
            .ok_or_else(|| mismatch(key, ValueKind::Blob, value.kind()))
    }

    /// Decodes a blob stored with [`MemoryValue::encode`].
    pub fn get_decoded<T: DeserializeOwned>(&self, key: &str) -> Result<T, MemoryError> {
        self.get(key)?.decode()
    }

    /// Keys that currently have a readable value.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.previous.keys().map(String::as_str)
    }

    /// Every declared key, compute and result alike, sorted by name.
    pub fn declared_keys(&self) -> Vec<MemoryKey> {
        let mut keys: Vec<_> = self
            .current
            .iter()
            .map(|(name, slot)| MemoryKey::new(name.clone(), slot.kind))
            .collect();
        keys.sort();
        keys
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.previous.contains_key(key)
    }

    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    #[inline]
    pub fn is_initial_iteration(&self) -> bool {
        self.iteration == 0
    }

    #[inline]
    pub fn runtime(&self) -> Duration {
        self.runtime
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    // ---------------------------------------------------------------------
    // Mutators (current buffer)
    // ---------------------------------------------------------------------

    /// Overwrites `current[key]`.
    pub fn set(&self, key: &str, value: impl Into<MemoryValue>) -> Result<(), MemoryError> {
        let value = value.into();
        let slot = self.writable(key, value.kind())?;
        *slot.cell.lock() = Some(value);
        Ok(())
    }

    /// Adds `delta` to `current[key]` (default 0) and returns
    /// `previous[key]` (default 0) plus `delta`.
    pub fn incr(&self, key: &str, delta: i64) -> Result<i64, MemoryError> {
        let slot = self.writable(key, ValueKind::Integer)?;
        {
            let mut cell = slot.cell.lock();
            let running = match cell.as_ref() {
                Some(v) => integer_of(key, v)?,
                None => 0,
            };
            *cell = Some(MemoryValue::Integer(running.wrapping_add(delta)));
        }
        let base = match self.previous.get(key) {
            Some(v) => integer_of(key, v)?,
            None => 0,
        };
        Ok(base.wrapping_add(delta))
    }

    /// Shorthand for `incr(key, -delta)`.
    pub fn decr(&self, key: &str, delta: i64) -> Result<i64, MemoryError> {
        self.incr(key, delta.wrapping_neg())
    }

    /// Logical AND into `current[key]` (default `true`); returns
    /// `previous[key]` (default `true`) AND `operand`.
    pub fn and(&self, key: &str, operand: bool) -> Result<bool, MemoryError> {
        self.fold_boolean(key, operand, |a, b| a && b)
    }

    /// Logical OR into `current[key]` (default `true`); returns
    /// `previous[key]` (default `true`) OR `operand`.
    pub fn or(&self, key: &str, operand: bool) -> Result<bool, MemoryError> {
        self.fold_boolean(key, operand, |a, b| a || b)
    }

    fn fold_boolean(
        &self,
        key: &str,
        operand: bool,
        op: impl Fn(bool, bool) -> bool,
    ) -> Result<bool, MemoryError> {
        let slot = self.writable(key, ValueKind::Boolean)?;
        {
            let mut cell = slot.cell.lock();
            let running = match cell.as_ref() {
                Some(v) => boolean_of(key, v)?,
                None => true,
            };
            *cell = Some(MemoryValue::Boolean(op(operand, running)));
        }
        let base = match self.previous.get(key) {
            Some(v) => boolean_of(key, v)?,
            None => true,
        };
        Ok(op(base, operand))
    }

    /// Resolves the slot for a mutation, checking completion, key and kind in that order.
    fn writable(&self, key: &str, kind: ValueKind) -> Result<&Slot, MemoryError> {
        if self.complete {
            return Err(MemoryError::ImmutableMemory(key.to_string()));
        }
        let slot = match self.current.get(key) {
            Some(slot) if slot.role == KeyRole::Compute => slot,
            _ => return Err(MemoryError::UnrecognizedKey(key.to_string())),
        };
        if slot.kind != kind {
            return Err(mismatch(key, slot.kind, kind));
        }
        Ok(slot)
    }

    // ---------------------------------------------------------------------
    // Barrier-side administration (&mut self)
    // ---------------------------------------------------------------------

    /// Makes this superstep's writes the next superstep's read snapshot.
    pub fn complete_superstep(&mut self) {
        self.previous = self
            .current
            .iter_mut()
            .filter_map(|(k, slot)| slot.cell.get_mut().clone().map(|v| (k.clone(), v)))
            .collect();
    }

    /// Discards this superstep's writes, resetting `current` to `previous`.
    pub fn rollback_superstep(&mut self) {
        for (k, slot) in self.current.iter_mut() {
            *slot.cell.get_mut() = self.previous.get(k).cloned();
        }
    }

    pub fn incr_iteration(&mut self) {
        self.iteration += 1;
    }

    /// Records the wall-clock time spent so far.
    pub fn set_runtime(&mut self, runtime: Duration) -> Result<(), MemoryError> {
        if self.complete {
            return Err(MemoryError::ImmutableMemory("runtime".to_string()));
        }
        self.runtime = runtime;
        Ok(())
    }

    /// Freezes memory after the final superstep.
    ///
    /// The iteration counter gives back the advance made after the last
    /// termination check, `current` becomes the readable snapshot, and every
    /// mutator fails with [`MemoryError::ImmutableMemory`] from now on.
    pub fn complete(&mut self) {
        self.iteration = self.iteration.saturating_sub(1);
        self.previous = self
            .current
            .iter_mut()
            .filter_map(|(k, slot)| slot.cell.get_mut().take().map(|v| (k.clone(), v)))
            .collect();
        self.complete = true;
    }

    /// Stores a map-reduce result under its registered key.
    ///
    /// This is the only write permitted after [`Memory::complete`].
    pub(crate) fn store_result(&mut self, key: &str, value: MemoryValue) -> Result<(), MemoryError> {
        let slot = match self.current.get(key) {
            Some(slot) if slot.role == KeyRole::Result => slot,
            _ => return Err(MemoryError::UnrecognizedKey(key.to_string())),
        };
        if slot.kind != value.kind() {
            return Err(mismatch(key, slot.kind, value.kind()));
        }
        self.previous.insert(key.to_string(), value);
        Ok(())
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "memory[size:{}]", self.previous.len())
    }
}

#[inline]
fn mismatch(key: &str, expected: ValueKind, found: ValueKind) -> MemoryError {
    MemoryError::UnsupportedValueType {
        key: key.to_string(),
        expected,
        found,
    }
}

fn integer_of(key: &str, v: &MemoryValue) -> Result<i64, MemoryError> {
    v.as_integer()
        .ok_or_else(|| mismatch(key, ValueKind::Integer, v.kind()))
}

fn boolean_of(key: &str, v: &MemoryValue) -> Result<bool, MemoryError> {
    v.as_boolean()
        .ok_or_else(|| mismatch(key, ValueKind::Boolean, v.kind()))
}
