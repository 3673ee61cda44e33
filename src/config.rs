//! Flat configuration records and run settings.
//!
//! Vertex programs and map-reduce jobs persist their parameters through
//! [`PersistState`]: an explicit store/load round trip against a
//! [`Configuration`], a flat `String → ConfigValue` record. Option names are
//! owned by each program or job; the record itself attaches no meaning to them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::compute_error::ConfigError;

/// A scalar configuration value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Boolean(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Integer(v)
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::Text(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Text(v.to_string())
    }
}

/// A flat key-value configuration record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(BTreeMap<String, ConfigValue>);

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Text value of `key`, `Ok(None)` when absent.
    pub fn get_string(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(ConfigValue::Text(s)) => Ok(Some(s)),
            Some(other) => Err(wrong_type(key, "text", other)),
        }
    }

    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(ConfigValue::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(wrong_type(key, "integer", other)),
        }
    }

    /// Float value of `key`; integers are widened.
    pub fn get_f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(ConfigValue::Float(f)) => Ok(Some(*f)),
            Some(ConfigValue::Integer(i)) => Ok(Some(*i as f64)),
            Some(other) => Err(wrong_type(key, "float", other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(ConfigValue::Boolean(b)) => Ok(Some(*b)),
            Some(other) => Err(wrong_type(key, "boolean", other)),
        }
    }

    /// Non-negative integer value of `key`.
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>, ConfigError> {
        match self.get_i64(key)? {
            None => Ok(None),
            Some(i) => usize::try_from(i)
                .map(Some)
                .map_err(|_| ConfigError::InvalidParameter {
                    name: key.to_string(),
                    reason: format!("expected a non-negative integer, got {i}"),
                }),
        }
    }

    pub fn get_string_or<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str, ConfigError> {
        Ok(self.get_string(key)?.unwrap_or(default))
    }

    pub fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        Ok(self.get_f64(key)?.unwrap_or(default))
    }

    pub fn get_usize_or(&self, key: &str, default: usize) -> Result<usize, ConfigError> {
        Ok(self.get_usize(key)?.unwrap_or(default))
    }

    pub fn require_string(&self, key: &str) -> Result<&str, ConfigError> {
        self.get_string(key)?.ok_or_else(|| missing(key))
    }

    pub fn require_i64(&self, key: &str) -> Result<i64, ConfigError> {
        self.get_i64(key)?.ok_or_else(|| missing(key))
    }

    pub fn require_f64(&self, key: &str) -> Result<f64, ConfigError> {
        self.get_f64(key)?.ok_or_else(|| missing(key))
    }
}

fn missing(key: &str) -> ConfigError {
    ConfigError::MissingParameter(key.to_string())
}

fn wrong_type(key: &str, expected: &str, found: &ConfigValue) -> ConfigError {
    ConfigError::InvalidParameter {
        name: key.to_string(),
        reason: format!("expected {expected}, found {found:?}"),
    }
}

/// Explicit persistence of a program's or job's parameters.
///
/// `load_state(store_state(x))` must reconstruct a value equivalent to `x`.
pub trait PersistState: Sized {
    fn store_state(&self, configuration: &mut Configuration);

    fn load_state(configuration: &Configuration) -> Result<Self, ConfigError>;
}

/// Record key naming the persisted implementation.
pub const IMPLEMENTATION_KEY: &str = "superstep.implementation";

/// Checks that a record was stored by `expected`, if it names an implementation at all.
pub fn check_implementation(configuration: &Configuration, expected: &str) -> Result<(), ConfigError> {
    match configuration.get_string(IMPLEMENTATION_KEY)? {
        Some(found) if found != expected => Err(ConfigError::InvalidParameter {
            name: IMPLEMENTATION_KEY.to_string(),
            reason: format!("record was stored by `{found}`, not `{expected}`"),
        }),
        _ => Ok(()),
    }
}

/// Settings of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputerConfig {
    /// Worker threads; `None` uses rayon's default.
    pub workers: Option<usize>,
    /// Map partitions per map-reduce job; `None` uses one per worker.
    pub partitions: Option<usize>,
    /// Abort if the program has not terminated after this many supersteps.
    pub max_supersteps: Option<usize>,
}

impl Default for ComputerConfig {
    fn default() -> Self {
        Self {
            workers: None,
            partitions: None,
            max_supersteps: None,
        }
    }
}

const WORKERS: &str = "superstep.computer.workers";
const PARTITIONS: &str = "superstep.computer.partitions";
const MAX_SUPERSTEPS: &str = "superstep.computer.maxSupersteps";

impl PersistState for ComputerConfig {
    fn store_state(&self, configuration: &mut Configuration) {
        let entries = [
            (WORKERS, self.workers),
            (PARTITIONS, self.partitions),
            (MAX_SUPERSTEPS, self.max_supersteps),
        ];
        for (key, value) in entries {
            match value {
                Some(v) => configuration.set_property(key, v as i64),
                None => {
                    configuration.remove(key);
                }
            }
        }
    }

    fn load_state(configuration: &Configuration) -> Result<Self, ConfigError> {
        let cfg = Self {
            workers: configuration.get_usize(WORKERS)?,
            partitions: configuration.get_usize(PARTITIONS)?,
            max_supersteps: configuration.get_usize(MAX_SUPERSTEPS)?,
        };
        if cfg.partitions == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: PARTITIONS.to_string(),
                reason: "at least one partition is required".to_string(),
            });
        }
        Ok(cfg)
    }
}
