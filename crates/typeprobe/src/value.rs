//! Dynamic values
//!
//! `Value` is the one representation used for marker data captured at
//! declaration time and for field/argument values crossing the member
//! accessor. It serializes untagged, so catalog files can write marker data
//! as plain TOML/JSON literals.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ProbeError;

/// Runtime kind of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Absent value
    Null,
    /// Boolean
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit float
    Float,
    /// UTF-8 string
    Str,
    /// Ordered list
    List,
    /// String-keyed map
    Map,
}

impl ValueKind {
    /// Lowercase name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "str",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dynamically-typed value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Str(String),
    /// List
    List(Vec<Value>),
    /// Map with deterministic key order
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Runtime kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Check if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as list if this is a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key if this is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Convert into a Rust type, failing on a kind mismatch
    pub fn extract<T: FromValue>(self) -> Result<T, ValueMismatch> {
        T::from_value(self)
    }
}

/// A value did not have the kind a conversion expected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Type mismatch: expected {expected}, got {got}")]
pub struct ValueMismatch {
    /// Kind the conversion expected
    pub expected: ValueKind,
    /// Kind that was supplied
    pub got: ValueKind,
}

impl From<ValueMismatch> for ProbeError {
    fn from(err: ValueMismatch) -> Self {
        ProbeError::Raised(anyhow::Error::new(err))
    }
}

// ============================================================================
// Conversion Traits
// ============================================================================

/// Convert from [`Value`] to a Rust type.
pub trait FromValue: Sized {
    /// Kind of value this type converts from
    const KIND: ValueKind;

    /// Convert, returning an error if the kind doesn't match.
    fn from_value(value: Value) -> Result<Self, ValueMismatch>;
}

/// Convert a Rust type into a [`Value`].
pub trait IntoValue {
    /// Convert to Value.
    fn into_value(self) -> Value;
}

fn mismatch(expected: ValueKind, value: &Value) -> ValueMismatch {
    ValueMismatch {
        expected,
        got: value.kind(),
    }
}

impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        value.as_bool().ok_or_else(|| mismatch(Self::KIND, &value))
    }
}

impl FromValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        value.as_int().ok_or_else(|| mismatch(Self::KIND, &value))
    }
}

impl FromValue for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        value
            .as_int()
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| mismatch(Self::KIND, &value))
    }
}

impl FromValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        value.as_float().ok_or_else(|| mismatch(Self::KIND, &value))
    }
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::Str;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(Self::KIND, &other)),
        }
    }
}

impl FromValue for Vec<Value> {
    const KIND: ValueKind = ValueKind::List;

    fn from_value(value: Value) -> Result<Self, ValueMismatch> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(mismatch(Self::KIND, &other)),
        }
    }
}

impl<T: Into<Value>> IntoValue for T {
    fn into_value(self) -> Value {
        self.into()
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::Int(u as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}
