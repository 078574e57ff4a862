//! Value and `DataType` definitions for ruql.
//!
//! [`Value`] is the closed set of logical types the engine knows about. Every
//! binary operation matches on the pair of operands; the arms for equal tags
//! carry the per-type behavior and the catch-all arm reports a
//! [`RelError::TypeMismatch`].

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RelError, Result};

/// Supported data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit floating point.
    Float32,
    /// Fixed-length character data.
    Char,
    /// Boolean.
    Bool,
}

impl DataType {
    /// Returns the name of the data type as used in SQL.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int32 => "INT",
            DataType::Int64 => "LONG",
            DataType::Float32 => "FLOAT",
            DataType::Char => "CHAR",
            DataType::Bool => "BOOL",
        }
    }

    /// Parses a SQL type name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INT" => Some(DataType::Int32),
            "LONG" => Some(DataType::Int64),
            "FLOAT" => Some(DataType::Float32),
            "CHAR" => Some(DataType::Char),
            "BOOL" => Some(DataType::Bool),
            _ => None,
        }
    }

    /// Returns the storage width for fixed-width types.
    #[must_use]
    pub fn byte_size(&self) -> Option<usize> {
        match self {
            DataType::Int32 | DataType::Float32 => Some(4),
            DataType::Int64 => Some(8),
            DataType::Bool => Some(1),
            DataType::Char => None,
        }
    }

    /// Returns whether this type is numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int64 | DataType::Float32)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime value container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// 32-bit signed integer value.
    Int32(i32),
    /// 64-bit signed integer value.
    Int64(i64),
    /// 32-bit floating point value.
    Float32(f32),
    /// Character data.
    Char(String),
    /// Boolean value.
    Bool(bool),
    /// Absent value. Only produced by aggregations over empty input.
    Null,
}

// Floats compare by bit pattern so that Eq and Hash agree.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Float32(v) => v.to_bits().hash(state),
            Value::Char(v) => v.hash(state),
            Value::Bool(v) => v.hash(state),
            Value::Null => {}
        }
    }
}

fn mismatch(expected: &Value, actual: &Value) -> RelError {
    RelError::TypeMismatch {
        expected: expected.type_name().to_string(),
        actual: actual.type_name().to_string(),
    }
}

impl Value {
    /// Returns the data type of this value, or None for Null.
    #[must_use]
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float32(_) => Some(DataType::Float32),
            Value::Char(_) => Some(DataType::Char),
            Value::Bool(_) => Some(DataType::Bool),
            Value::Null => None,
        }
    }

    fn type_name(&self) -> &'static str {
        self.data_type().map_or("NULL", |t| t.name())
    }

    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to extract an i32 value.
    #[must_use]
    pub fn as_int32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to extract an i64 value.
    #[must_use]
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Char(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Attempts to extract a bool value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Three-way comparison of two values of the same type.
    ///
    /// Returns None if either value is null or the types differ. Floats are
    /// ordered with `total_cmp`, so the ordering is total for every type.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Float32(a), Value::Float32(b)) => Some(a.total_cmp(b)),
            (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Adds two values in their native width.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` for operands of different types and
    /// `Unsupported` for non-numeric types.
    pub fn add(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a.wrapping_add(*b))),
            (Value::Int64(a), Value::Int64(b)) => Ok(Value::Int64(a.wrapping_add(*b))),
            (Value::Float32(a), Value::Float32(b)) => Ok(Value::Float32(a + b)),
            _ => self.arithmetic_error("add", other),
        }
    }

    /// Subtracts `other` from `self` in their native width.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Value::add`].
    pub fn subtract(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a.wrapping_sub(*b))),
            (Value::Int64(a), Value::Int64(b)) => Ok(Value::Int64(a.wrapping_sub(*b))),
            (Value::Float32(a), Value::Float32(b)) => Ok(Value::Float32(a - b)),
            _ => self.arithmetic_error("subtract", other),
        }
    }

    /// Multiplies two values in their native width.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Value::add`].
    pub fn multiply(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a.wrapping_mul(*b))),
            (Value::Int64(a), Value::Int64(b)) => Ok(Value::Int64(a.wrapping_mul(*b))),
            (Value::Float32(a), Value::Float32(b)) => Ok(Value::Float32(a * b)),
            _ => self.arithmetic_error("multiply", other),
        }
    }

    /// Divides `self` by `other` in their native width.
    ///
    /// # Errors
    ///
    /// Returns `DivisionByZero` for integer division by zero, otherwise the
    /// same conditions as [`Value::add`].
    pub fn divide(&self, other: &Value) -> Result<Value> {
        match (self, other) {
            (Value::Int32(_), Value::Int32(0)) | (Value::Int64(_), Value::Int64(0)) => {
                Err(RelError::DivisionByZero)
            }
            (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a.wrapping_div(*b))),
            (Value::Int64(a), Value::Int64(b)) => Ok(Value::Int64(a.wrapping_div(*b))),
            (Value::Float32(a), Value::Float32(b)) => Ok(Value::Float32(a / b)),
            _ => self.arithmetic_error("divide", other),
        }
    }

    /// Negates a numeric value in its native width.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` for non-numeric types.
    pub fn negate(&self) -> Result<Value> {
        match self {
            Value::Int32(v) => Ok(Value::Int32(v.wrapping_neg())),
            Value::Int64(v) => Ok(Value::Int64(v.wrapping_neg())),
            Value::Float32(v) => Ok(Value::Float32(-v)),
            _ => Err(RelError::Unsupported(format!(
                "negate is not defined for {}",
                self.type_name()
            ))),
        }
    }

    fn arithmetic_error(&self, op: &str, other: &Value) -> Result<Value> {
        if self.data_type() != other.data_type() {
            return Err(mismatch(self, other));
        }
        Err(RelError::Unsupported(format!(
            "{op} is not defined for {}",
            self.type_name()
        )))
    }

    /// Constructs a value of `data_type` from its textual form.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` for types without a textual constructor
    /// (`LONG`) and `InvalidArgument` when the text does not parse.
    pub fn from_string(data_type: DataType, text: &str) -> Result<Value> {
        let invalid = || RelError::InvalidArgument(format!("'{text}' is not a valid {data_type}"));
        match data_type {
            DataType::Int32 => text.trim().parse().map(Value::Int32).map_err(|_| invalid()),
            DataType::Float32 => text.trim().parse().map(Value::Float32).map_err(|_| invalid()),
            DataType::Char => Ok(Value::Char(text.to_string())),
            DataType::Bool => match text.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            DataType::Int64 => Err(RelError::Unsupported(
                "LONG values cannot be constructed from text".into(),
            )),
        }
    }

    /// Converts this value to `target`, widening numerics where lossless.
    ///
    /// # Errors
    ///
    /// Returns `Unsupported` when no conversion between the types exists.
    #[allow(clippy::cast_precision_loss)]
    pub fn cast_to(&self, target: DataType) -> Result<Value> {
        if self.data_type() == Some(target) {
            return Ok(self.clone());
        }
        match (self, target) {
            (Value::Int32(v), DataType::Int64) => Ok(Value::Int64(i64::from(*v))),
            (Value::Int32(v), DataType::Float32) => Ok(Value::Float32(*v as f32)),
            (Value::Int64(v), DataType::Float32) => Ok(Value::Float32(*v as f32)),
            (Value::Int64(v), DataType::Int32) => i32::try_from(*v)
                .map(Value::Int32)
                .map_err(|_| RelError::InvalidArgument(format!("{v} does not fit in INT"))),
            _ => Err(RelError::Unsupported(format!(
                "cannot cast {} to {target}",
                self.type_name()
            ))),
        }
    }

    /// Returns the storage bytes of this value.
    ///
    /// Numerics are little-endian; character data is its UTF-8 bytes without
    /// a terminator.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Int32(v) => v.to_le_bytes().to_vec(),
            Value::Int64(v) => v.to_le_bytes().to_vec(),
            Value::Float32(v) => v.to_le_bytes().to_vec(),
            Value::Char(s) => s.as_bytes().to_vec(),
            Value::Bool(b) => vec![u8::from(*b)],
            Value::Null => Vec::new(),
        }
    }

    /// Returns the length in bytes of the storage form.
    #[must_use]
    pub fn length(&self) -> usize {
        match self {
            Value::Char(s) => s.len(),
            Value::Null => 0,
            other => other.data_type().and_then(|t| t.byte_size()).unwrap_or(0),
        }
    }

    /// Decodes a value of `data_type` from a record field's bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the slice is too short for the type.
    pub fn from_bytes(data_type: DataType, bytes: &[u8]) -> Result<Value> {
        fn fixed<const N: usize>(bytes: &[u8]) -> Result<[u8; N]> {
            bytes
                .get(..N)
                .and_then(|b| <[u8; N]>::try_from(b).ok())
                .ok_or_else(|| {
                    RelError::InvalidArgument(format!(
                        "field of {} bytes is too short, need {N}",
                        bytes.len()
                    ))
                })
        }

        match data_type {
            DataType::Int32 => Ok(Value::Int32(i32::from_le_bytes(fixed(bytes)?))),
            DataType::Int64 => Ok(Value::Int64(i64::from_le_bytes(fixed(bytes)?))),
            DataType::Float32 => Ok(Value::Float32(f32::from_le_bytes(fixed(bytes)?))),
            DataType::Bool => Ok(Value::Bool(fixed::<1>(bytes)?[0] != 0)),
            DataType::Char => {
                let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                Ok(Value::Char(String::from_utf8_lossy(&bytes[..end]).into_owned()))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Char(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => f.write_str("NULL"),
        }
    }
}
