use std::cmp::Ordering;
use std::fmt;

use crate::common::{DbError, Result, STRING_LEN};

use super::DataType;

/// Comparison operators usable between two values of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
    /// Substring match for Text; equality for Integer
    Like,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Equals => "=",
            CompareOp::NotEquals => "<>",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEq => "<=",
            CompareOp::GreaterThan => ">",
            CompareOp::GreaterThanOrEq => ">=",
            CompareOp::Like => "LIKE",
        };
        f.write_str(s)
    }
}

/// Represents a typed value that can be stored in a tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// 32-bit signed integer
    Integer(i32),

    /// Bounded string (at most STRING_LEN bytes survive a round trip to disk)
    Text(String),
}

impl Value {
    /// Returns the DataType of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Integer(_) => DataType::Integer,
            Value::Text(_) => DataType::Text,
        }
    }

    /// Returns the integer payload, if this is an Integer.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    /// Returns the string payload, if this is a Text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Integer(_) => None,
        }
    }

    /// Orders two values of the same variant.
    /// Fails with `TypeMismatch` when the variants differ.
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
            _ => Err(DbError::TypeMismatch {
                expected: self.data_type().to_string(),
                found: other.data_type().to_string(),
            }),
        }
    }

    /// Evaluates `self <op> other`.
    /// Fails with `TypeMismatch` when the variants differ.
    pub fn compare(&self, op: CompareOp, other: &Value) -> Result<bool> {
        if op == CompareOp::Like {
            return match (self, other) {
                (Value::Text(a), Value::Text(b)) => Ok(a.contains(b.as_str())),
                _ => self.try_cmp(other).map(|ord| ord == Ordering::Equal),
            };
        }

        let ord = self.try_cmp(other)?;
        Ok(match op {
            CompareOp::Equals => ord == Ordering::Equal,
            CompareOp::NotEquals => ord != Ordering::Equal,
            CompareOp::LessThan => ord == Ordering::Less,
            CompareOp::LessThanOrEq => ord != Ordering::Greater,
            CompareOp::GreaterThan => ord == Ordering::Greater,
            CompareOp::GreaterThanOrEq => ord != Ordering::Less,
            CompareOp::Like => unreachable!(),
        })
    }

    /// Appends the fixed-width encoding of this value to `out`.
    /// Text longer than STRING_LEN bytes is cut at the last char boundary
    /// that fits.
    pub fn serialize_into(&self, out: &mut Vec<u8>) {
        match self {
            Value::Integer(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Text(s) => {
                let mut len = s.len().min(STRING_LEN);
                while !s.is_char_boundary(len) {
                    len -= 1;
                }
                out.extend_from_slice(&(len as u32).to_le_bytes());
                out.extend_from_slice(&s.as_bytes()[..len]);
                out.resize(out.len() + STRING_LEN - len, 0);
            }
        }
    }

    /// Deserializes a value from bytes according to the given DataType.
    /// Returns the value and number of bytes consumed, or None for short
    /// input, an oversized Text length or Text that is not valid UTF-8.
    pub fn deserialize(data: &[u8], data_type: DataType) -> Option<(Self, usize)> {
        let width = data_type.width();
        if data.len() < width {
            return None;
        }

        match data_type {
            DataType::Integer => {
                let v = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
                Some((Value::Integer(v), width))
            }
            DataType::Text => {
                let len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
                if len > STRING_LEN {
                    return None;
                }
                let s = String::from_utf8(data[4..4 + len].to_vec()).ok()?;
                Some((Value::Text(s), width))
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
