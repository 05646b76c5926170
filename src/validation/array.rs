//! Array-shaped checks: sizes, uniqueness, `contains` and the
//! prefix/items/unevaluated index logic.
use super::{is_valid, validate_node, ErrorSink};
use crate::{
    error::ValidationError,
    paths::InstancePath,
    schema::{BoolOrSchema, SchemaNode},
};
use ahash::AHashSet;
use serde_json::Value;

/// `contains` with `minContains`/`maxContains`. Without an explicit
/// `minContains`, at least one element must match.
pub(super) fn check_contains(
    node: &SchemaNode,
    items: &[Value],
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    let contains = match &node.contains {
        Some(contains) => contains,
        None => return,
    };
    let matched = items.iter().filter(|item| is_valid(contains, item)).count() as u64;
    let minimum = node.min_contains.unwrap_or(1);
    if matched < minimum {
        if node.min_contains.is_some() {
            sink.push(ValidationError::min_contains(path.into(), instance, minimum));
        } else {
            sink.push(ValidationError::contains(path.into(), instance));
        }
    }
    if let Some(maximum) = node.max_contains {
        if matched > maximum {
            sink.push(ValidationError::max_contains(path.into(), instance, maximum));
        }
    }
}

/// Array-candidate checks. `prefixItems` is index-matched first, `items`
/// covers the tail, `unevaluatedItems` covers indexes neither reached.
pub(super) fn check_array(
    node: &SchemaNode,
    items: &[Value],
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    if let Some(limit) = node.max_items {
        if items.len() as u64 > limit {
            sink.push(ValidationError::max_items(path.into(), instance, limit));
        }
    }
    if let Some(limit) = node.min_items {
        if (items.len() as u64) < limit {
            sink.push(ValidationError::min_items(path.into(), instance, limit));
        }
    }
    if node.unique_items && !items_unique(items) {
        sink.push(ValidationError::unique_items(path.into(), instance));
    }
    let prefix_length = node.prefix_items.as_ref().map_or(0, Vec::len);
    for (index, item) in items.iter().enumerate() {
        let _guard = path.descend(index);
        if index < prefix_length {
            let prefix = node
                .prefix_items
                .as_ref()
                .expect("Non-zero prefix length implies prefixItems");
            validate_node(&prefix[index], item, path, sink);
        } else if let Some(items_schema) = &node.items {
            validate_node(items_schema, item, path, sink);
        } else {
            match &node.unevaluated_items {
                None | Some(BoolOrSchema::Bool(true)) => {}
                Some(BoolOrSchema::Bool(false)) => {
                    sink.push(ValidationError::boolean_false(path.into(), item));
                }
                Some(BoolOrSchema::Schema(schema)) => validate_node(schema, item, path, sink),
            }
        }
    }
}

/// Uniqueness is restricted to comparable scalars; arrays and objects
/// never count as duplicates of anything.
fn items_unique(items: &[Value]) -> bool {
    let mut seen = AHashSet::with_capacity(items.len());
    for item in items {
        if let Some(key) = ScalarKey::of(item) {
            if !seen.insert(key) {
                return false;
            }
        }
    }
    true
}

#[derive(PartialEq, Eq, Hash)]
enum ScalarKey {
    Null,
    Bool(bool),
    Integer(i64),
    Float(u64),
    Text(String),
}

impl ScalarKey {
    fn of(value: &Value) -> Option<ScalarKey> {
        match value {
            Value::Null => Some(ScalarKey::Null),
            Value::Bool(boolean) => Some(ScalarKey::Bool(*boolean)),
            Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    Some(ScalarKey::Integer(integer))
                } else {
                    let float = number.as_f64().expect("Always valid");
                    // Integral floats collapse onto their integer key so
                    // 1 and 1.0 count as duplicates
                    if float.fract() == 0.0 && float >= i64::MIN as f64 && float <= i64::MAX as f64
                    {
                        Some(ScalarKey::Integer(float as i64))
                    } else {
                        Some(ScalarKey::Float(float.to_bits()))
                    }
                }
            }
            Value::String(text) => Some(ScalarKey::Text(text.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}
