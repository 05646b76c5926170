//! Equality and comparison over parsed values with mixed-width numbers.
use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

macro_rules! num_cmp {
    ($left:expr, $right:expr) => {
        if let Some(b) = $right.as_u64() {
            NumCmp::num_eq($left, b)
        } else if let Some(b) = $right.as_i64() {
            NumCmp::num_eq($left, b)
        } else {
            NumCmp::num_eq($left, $right.as_f64().expect("Always valid"))
        }
    };
}

#[inline]
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::Null, Value::Null) => true,
        (Value::Number(left), Value::Number(right)) => {
            if let Some(a) = left.as_u64() {
                num_cmp!(a, right)
            } else if let Some(a) = left.as_i64() {
                num_cmp!(a, right)
            } else {
                let a = left.as_f64().expect("Always valid");
                num_cmp!(a, right)
            }
        }
        (Value::Array(left), Value::Array(right)) => equal_arrays(left, right),
        (Value::Object(left), Value::Object(right)) => equal_objects(left, right),
        (_, _) => false,
    }
}

#[inline]
pub(crate) fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len() && left.iter().zip(right.iter()).all(|(a, b)| equal(a, b))
}

#[inline]
pub(crate) fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|((ka, va), (kb, vb))| ka == kb && equal(va, vb))
}

macro_rules! limit_cmp {
    ($name:ident, $op:ident) => {
        #[inline]
        pub(crate) fn $name(number: &Number, limit: f64) -> bool {
            if let Some(value) = number.as_u64() {
                NumCmp::$op(value, limit)
            } else if let Some(value) = number.as_i64() {
                NumCmp::$op(value, limit)
            } else {
                NumCmp::$op(number.as_f64().expect("Always valid"), limit)
            }
        }
    };
}

limit_cmp!(num_le, num_le);
limit_cmp!(num_lt, num_lt);
limit_cmp!(num_ge, num_ge);
limit_cmp!(num_gt, num_gt);

/// Integral numbers are integers, and so are floats with a zero fraction.
#[inline]
pub(crate) fn is_integer(number: &Number) -> bool {
    number.is_u64()
        || number.is_i64()
        || number.as_f64().map_or(false, |value| value.fract() == 0.0)
}
