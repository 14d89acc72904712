//! Log field type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive kinds a log field may declare.
///
/// Every kind has a one-character wire code (used in FORMAT descriptors and
/// INFO/PARAMETER headers) and a fixed little-endian byte width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FieldType {
    /// 8-bit signed integer (`b`)
    Int8,
    /// 8-bit unsigned integer (`B`)
    UInt8,
    /// 16-bit signed integer (`h`)
    Int16,
    /// 16-bit unsigned integer (`H`)
    UInt16,
    /// 32-bit signed integer (`i`)
    Int32,
    /// 32-bit unsigned integer (`I`)
    UInt32,
    /// 64-bit signed integer (`q`)
    Int64,
    /// 64-bit unsigned integer (`Q`)
    UInt64,
    /// 32-bit floating point (`f`)
    Float32,
    /// 64-bit floating point (`d`)
    Float64,
    /// Boolean stored as one byte (`?`)
    Bool,
    /// 8-bit character (`c`)
    Char,
}

impl FieldType {
    /// All field types, in wire-code table order.
    pub const ALL: [FieldType; 12] = [
        FieldType::Int8,
        FieldType::UInt8,
        FieldType::Int16,
        FieldType::UInt16,
        FieldType::Int32,
        FieldType::UInt32,
        FieldType::Int64,
        FieldType::UInt64,
        FieldType::Float32,
        FieldType::Float64,
        FieldType::Bool,
        FieldType::Char,
    ];

    /// Returns the size in bytes of one element of this type.
    pub const fn size(&self) -> usize {
        match self {
            FieldType::Int8 | FieldType::UInt8 | FieldType::Bool | FieldType::Char => 1,
            FieldType::Int16 | FieldType::UInt16 => 2,
            FieldType::Int32 | FieldType::UInt32 | FieldType::Float32 => 4,
            FieldType::Int64 | FieldType::UInt64 | FieldType::Float64 => 8,
        }
    }

    /// Wire code used in FORMAT descriptors.
    pub const fn code(&self) -> char {
        match self {
            FieldType::Int8 => 'b',
            FieldType::UInt8 => 'B',
            FieldType::Int16 => 'h',
            FieldType::UInt16 => 'H',
            FieldType::Int32 => 'i',
            FieldType::UInt32 => 'I',
            FieldType::Int64 => 'q',
            FieldType::UInt64 => 'Q',
            FieldType::Float32 => 'f',
            FieldType::Float64 => 'd',
            FieldType::Bool => '?',
            FieldType::Char => 'c',
        }
    }

    /// Resolve a wire code. Returns `None` for codes outside the table.
    pub const fn from_code(code: char) -> Option<FieldType> {
        match code {
            'b' => Some(FieldType::Int8),
            'B' => Some(FieldType::UInt8),
            'h' => Some(FieldType::Int16),
            'H' => Some(FieldType::UInt16),
            'i' => Some(FieldType::Int32),
            'I' => Some(FieldType::UInt32),
            'q' => Some(FieldType::Int64),
            'Q' => Some(FieldType::UInt64),
            'f' => Some(FieldType::Float32),
            'd' => Some(FieldType::Float64),
            '?' => Some(FieldType::Bool),
            'c' => Some(FieldType::Char),
            _ => None,
        }
    }

    /// C-style type name, as reported in the field catalog.
    pub const fn name(&self) -> &'static str {
        match self {
            FieldType::Int8 => "int8_t",
            FieldType::UInt8 => "uint8_t",
            FieldType::Int16 => "int16_t",
            FieldType::UInt16 => "uint16_t",
            FieldType::Int32 => "int32_t",
            FieldType::UInt32 => "uint32_t",
            FieldType::Int64 => "int64_t",
            FieldType::UInt64 => "uint64_t",
            FieldType::Float32 => "float",
            FieldType::Float64 => "double",
            FieldType::Bool => "bool",
            FieldType::Char => "char",
        }
    }

    /// Decode one element from exactly `self.size()` little-endian bytes.
    ///
    /// Callers guarantee the slice length; a shorter slice yields `None`.
    pub fn decode(&self, bytes: &[u8]) -> Option<Value> {
        let value = match self {
            FieldType::Int8 => Value::Int8(*bytes.first()? as i8),
            FieldType::UInt8 => Value::UInt8(*bytes.first()?),
            FieldType::Bool => Value::Bool(*bytes.first()? != 0),
            FieldType::Char => Value::Char(*bytes.first()?),
            FieldType::Int16 => Value::Int16(i16::from_le_bytes(bytes.get(..2)?.try_into().ok()?)),
            FieldType::UInt16 => {
                Value::UInt16(u16::from_le_bytes(bytes.get(..2)?.try_into().ok()?))
            }
            FieldType::Int32 => Value::Int32(i32::from_le_bytes(bytes.get(..4)?.try_into().ok()?)),
            FieldType::UInt32 => {
                Value::UInt32(u32::from_le_bytes(bytes.get(..4)?.try_into().ok()?))
            }
            FieldType::Int64 => Value::Int64(i64::from_le_bytes(bytes.get(..8)?.try_into().ok()?)),
            FieldType::UInt64 => {
                Value::UInt64(u64::from_le_bytes(bytes.get(..8)?.try_into().ok()?))
            }
            FieldType::Float32 => {
                Value::Float32(f32::from_le_bytes(bytes.get(..4)?.try_into().ok()?))
            }
            FieldType::Float64 => {
                Value::Float64(f64::from_le_bytes(bytes.get(..8)?.try_into().ok()?))
            }
        };
        Some(value)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime value type that can hold any decoded log field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum Value {
    Char(u8),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    /// Character array collapsed into text (INFO and PARAMETER values only)
    String(String),
    Array(Vec<Value>),
}

impl Value {
    /// Integer view of a scalar numeric value. Floats are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Char(v) | Value::UInt8(v) => Some(v as i64),
            Value::Int8(v) => Some(v as i64),
            Value::Int16(v) => Some(v as i64),
            Value::UInt16(v) => Some(v as i64),
            Value::Int32(v) => Some(v as i64),
            Value::UInt32(v) => Some(v as i64),
            Value::Int64(v) => Some(v),
            Value::UInt64(v) => i64::try_from(v).ok(),
            Value::Float32(v) => Some(v as i64),
            Value::Float64(v) => Some(v as i64),
            Value::Bool(v) => Some(v as i64),
            Value::String(_) | Value::Array(_) => None,
        }
    }

    /// Unsigned view of a non-negative scalar numeric value.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt64(v) => Some(v),
            _ => self.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    /// Floating-point view of a scalar numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float32(v) => Some(v as f64),
            Value::Float64(v) => Some(v),
            Value::UInt64(v) => Some(v as f64),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// Text view of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(v) => write!(f, "{}", *v as char),
            Value::Int8(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Array(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}
