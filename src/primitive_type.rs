//! Primitive JSON types and a compact set representation for the `type` keyword.
use serde_json::Value;
use std::{convert::TryFrom, fmt};

/// For faster candidate handling in the type loop we have this enum, to match
/// with it instead of a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveType::Array => write!(f, "array"),
            PrimitiveType::Boolean => write!(f, "boolean"),
            PrimitiveType::Integer => write!(f, "integer"),
            PrimitiveType::Null => write!(f, "null"),
            PrimitiveType::Number => write!(f, "number"),
            PrimitiveType::Object => write!(f, "object"),
            PrimitiveType::String => write!(f, "string"),
        }
    }
}

impl TryFrom<&str> for PrimitiveType {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "array" => Ok(PrimitiveType::Array),
            "boolean" => Ok(PrimitiveType::Boolean),
            "integer" => Ok(PrimitiveType::Integer),
            "null" => Ok(PrimitiveType::Null),
            "number" => Ok(PrimitiveType::Number),
            "object" => Ok(PrimitiveType::Object),
            "string" => Ok(PrimitiveType::String),
            _ => Err(()),
        }
    }
}

impl PrimitiveType {
    /// The primitive type of a parsed value. Integral numbers are reported
    /// as `Integer`.
    pub fn of(instance: &Value) -> PrimitiveType {
        match instance {
            Value::Null => PrimitiveType::Null,
            Value::Bool(_) => PrimitiveType::Boolean,
            Value::Number(number) => {
                if number.is_u64() || number.is_i64() {
                    PrimitiveType::Integer
                } else {
                    PrimitiveType::Number
                }
            }
            Value::String(_) => PrimitiveType::String,
            Value::Array(_) => PrimitiveType::Array,
            Value::Object(_) => PrimitiveType::Object,
        }
    }

    const fn to_index(self) -> u8 {
        match self {
            PrimitiveType::Array => 0,
            PrimitiveType::Boolean => 1,
            PrimitiveType::Integer => 2,
            PrimitiveType::Null => 3,
            PrimitiveType::Number => 4,
            PrimitiveType::Object => 5,
            PrimitiveType::String => 6,
        }
    }

    const fn from_index(index: u8) -> PrimitiveType {
        match index {
            0 => PrimitiveType::Array,
            1 => PrimitiveType::Boolean,
            2 => PrimitiveType::Integer,
            3 => PrimitiveType::Null,
            4 => PrimitiveType::Number,
            5 => PrimitiveType::Object,
            _ => PrimitiveType::String,
        }
    }
}

/// A set of primitive types packed into one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrimitiveTypesBitMap {
    inner: u8,
}

impl PrimitiveTypesBitMap {
    pub(crate) const fn new() -> Self {
        Self { inner: 0 }
    }

    #[must_use]
    pub(crate) const fn add_type(mut self, primitive_type: PrimitiveType) -> Self {
        self.inner |= 1 << primitive_type.to_index();
        self
    }

    pub(crate) const fn contains_type(self, primitive_type: PrimitiveType) -> bool {
        1 << primitive_type.to_index() & self.inner != 0
    }

    pub(crate) const fn is_empty(self) -> bool {
        self.inner == 0
    }

    pub(crate) const fn len(self) -> u32 {
        self.inner.count_ones()
    }

    pub(crate) fn union(self, other: Self) -> Self {
        Self {
            inner: self.inner | other.inner,
        }
    }
}

impl IntoIterator for PrimitiveTypesBitMap {
    type Item = PrimitiveType;
    type IntoIter = PrimitiveTypesBitMapIterator;

    fn into_iter(self) -> Self::IntoIter {
        PrimitiveTypesBitMapIterator { bit_map: self, index: 0 }
    }
}

#[derive(Debug)]
pub struct PrimitiveTypesBitMapIterator {
    bit_map: PrimitiveTypesBitMap,
    index: u8,
}

impl Iterator for PrimitiveTypesBitMapIterator {
    type Item = PrimitiveType;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < 7 {
            let current = PrimitiveType::from_index(self.index);
            self.index += 1;
            if self.bit_map.contains_type(current) {
                return Some(current);
            }
        }
        None
    }
}

impl fmt::Display for PrimitiveTypesBitMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for current in *self {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}", current)?;
        }
        Ok(())
    }
}
