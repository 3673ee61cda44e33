//! Values stored in [`Memory`](super::Memory).
//!
//! Memory is deliberately restricted to three kinds of values: integers,
//! booleans and opaque structural blobs. Blobs are plain bytes, so nothing
//! stored in memory can hold a reference back into memory-managed state.
//! Structured results (for example the pairs produced by a map-reduce job)
//! are encoded into blobs with `bincode`.

use bytes::Bytes;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;

use crate::compute_error::MemoryError;
use crate::mapreduce::KeyValue;

/// The kind of value a memory key accepts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    Integer,
    Boolean,
    Blob,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Blob => "blob",
        };
        f.write_str(name)
    }
}

/// A tagged memory value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryValue {
    Integer(i64),
    Boolean(bool),
    Blob(Bytes),
}

impl MemoryValue {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            MemoryValue::Integer(_) => ValueKind::Integer,
            MemoryValue::Boolean(_) => ValueKind::Boolean,
            MemoryValue::Blob(_) => ValueKind::Blob,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MemoryValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            MemoryValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Bytes> {
        match self {
            MemoryValue::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Encodes any serializable value into a blob.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Self, MemoryError> {
        bincode::serialize(value)
            .map(|buf| MemoryValue::Blob(Bytes::from(buf)))
            .map_err(|e| MemoryError::Codec(e.to_string()))
    }

    /// Decodes a blob produced by [`MemoryValue::encode`].
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, MemoryError> {
        match self {
            MemoryValue::Blob(buf) => {
                bincode::deserialize(buf).map_err(|e| MemoryError::Codec(e.to_string()))
            }
            other => Err(MemoryError::Codec(format!(
                "cannot decode a {} value",
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for MemoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryValue::Integer(i) => write!(f, "{i}"),
            MemoryValue::Boolean(b) => write!(f, "{b}"),
            MemoryValue::Blob(b) => write!(f, "blob[{} bytes]", b.len()),
        }
    }
}

impl From<i64> for MemoryValue {
    fn from(v: i64) -> Self {
        MemoryValue::Integer(v)
    }
}

impl From<bool> for MemoryValue {
    fn from(v: bool) -> Self {
        MemoryValue::Boolean(v)
    }
}

impl From<Bytes> for MemoryValue {
    fn from(v: Bytes) -> Self {
        MemoryValue::Blob(v)
    }
}

impl From<Vec<u8>> for MemoryValue {
    fn from(v: Vec<u8>) -> Self {
        MemoryValue::Blob(Bytes::from(v))
    }
}

/// Conversion of a map-reduce job's final result into a memory value.
///
/// `KIND` is registered as the kind of the job's side-effect key.
pub trait IntoMemoryValue {
    const KIND: ValueKind;

    fn into_memory_value(self) -> Result<MemoryValue, MemoryError>;
}

impl IntoMemoryValue for i64 {
    const KIND: ValueKind = ValueKind::Integer;

    fn into_memory_value(self) -> Result<MemoryValue, MemoryError> {
        Ok(MemoryValue::Integer(self))
    }
}

impl IntoMemoryValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn into_memory_value(self) -> Result<MemoryValue, MemoryError> {
        Ok(MemoryValue::Boolean(self))
    }
}

impl IntoMemoryValue for Bytes {
    const KIND: ValueKind = ValueKind::Blob;

    fn into_memory_value(self) -> Result<MemoryValue, MemoryError> {
        Ok(MemoryValue::Blob(self))
    }
}

impl<K: Serialize, V: Serialize> IntoMemoryValue for Vec<KeyValue<K, V>> {
    const KIND: ValueKind = ValueKind::Blob;

    fn into_memory_value(self) -> Result<MemoryValue, MemoryError> {
        MemoryValue::encode(&self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(MemoryValue::from(3i64).kind(), ValueKind::Integer);
        assert_eq!(MemoryValue::from(true).kind(), ValueKind::Boolean);
        assert_eq!(MemoryValue::from(vec![1u8, 2]).kind(), ValueKind::Blob);
    }

    #[test]
    fn blob_codec_preserves_structure() {
        let pairs = vec![KeyValue::new("a".to_string(), 1.5f64), KeyValue::new("b".into(), 2.0)];
        let value = pairs.clone().into_memory_value().unwrap();
        let back: Vec<KeyValue<String, f64>> = value.decode().unwrap();
        assert_eq!(back, pairs);
    }

    #[test]
    fn decoding_a_scalar_is_a_codec_error() {
        let err = MemoryValue::Integer(1).decode::<Vec<u8>>().unwrap_err();
        assert!(matches!(err, MemoryError::Codec(_)));
    }
}
