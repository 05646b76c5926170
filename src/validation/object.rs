//! Object-shaped checks: `required`, property recursion and the
//! additional/unevaluated property policies.
use super::{validate_node, ErrorSink};
use crate::{
    error::ValidationError,
    paths::InstancePath,
    patterns,
    schema::{BoolOrSchema, SchemaNode},
};
use serde_json::{Map, Value};

/// `required` plus `dependentRequired`. A property whose schema carries a
/// non-null default is treated as present; the default is injected during
/// unmarshal.
pub(super) fn check_required(
    node: &SchemaNode,
    map: &Map<String, Value>,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    for name in &node.required {
        if map.contains_key(name) {
            continue;
        }
        let has_default = node
            .properties
            .iter()
            .find(|(property, _)| property == name)
            .map_or(false, |(_, schema)| {
                matches!(&schema.inner.default, Some(default) if !default.is_null())
            });
        if !has_default {
            sink.push(ValidationError::required(path.into(), instance, name.clone()));
        }
    }
    for (property, dependencies) in &node.dependent_required {
        if !map.contains_key(property) {
            continue;
        }
        for dependency in dependencies {
            if !map.contains_key(dependency) {
                sink.push(ValidationError::required(
                    path.into(),
                    instance,
                    dependency.clone(),
                ));
            }
        }
    }
}

/// The boolean `additionalProperties: false` form: one error listing every
/// key that neither `properties` nor `patternProperties` covers.
pub(super) fn check_additional_false(
    node: &SchemaNode,
    map: &Map<String, Value>,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    if !matches!(node.additional_properties, Some(BoolOrSchema::Bool(false))) {
        return;
    }
    let unexpected: Vec<String> = map
        .keys()
        .filter(|key| !declared(node, key) && !pattern_covered(node, key))
        .cloned()
        .collect();
    if !unexpected.is_empty() {
        sink.push(ValidationError::additional_properties(
            path.into(),
            instance,
            unexpected,
        ));
    }
}

/// Object-candidate checks: sizes, `propertyNames`, declared property
/// recursion, `patternProperties`, the schema form of
/// `additionalProperties` and finally `unevaluatedProperties`.
pub(super) fn check_object(
    node: &SchemaNode,
    map: &Map<String, Value>,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    if let Some(limit) = node.max_properties {
        if map.len() as u64 > limit {
            sink.push(ValidationError::max_properties(path.into(), instance, limit));
        }
    }
    if let Some(limit) = node.min_properties {
        if (map.len() as u64) < limit {
            sink.push(ValidationError::min_properties(path.into(), instance, limit));
        }
    }
    if let Some(property_names) = &node.property_names {
        for key in map.keys() {
            let name = Value::String(key.clone());
            let _guard = path.descend(key.as_str());
            validate_node(property_names, &name, path, sink);
        }
    }
    for (name, schema) in &node.properties {
        if let Some(value) = map.get(name) {
            let _guard = path.descend(name.as_str());
            validate_node(schema, value, path, sink);
        }
    }
    for property in &node.pattern_properties {
        for (key, value) in map {
            if patterns::is_match(&property.matcher, key) {
                let _guard = path.descend(key.as_str());
                validate_node(&property.schema, value, path, sink);
            }
        }
    }
    if let Some(BoolOrSchema::Schema(additional)) = &node.additional_properties {
        for (key, value) in map {
            if declared(node, key) || pattern_covered(node, key) {
                continue;
            }
            let _guard = path.descend(key.as_str());
            validate_node(additional, value, path, sink);
        }
    }
    // `additionalProperties` runs first; anything it covered is no longer
    // unevaluated
    if node.additional_properties.is_none() {
        check_unevaluated(node, map, instance, path, sink);
    }
}

fn check_unevaluated(
    node: &SchemaNode,
    map: &Map<String, Value>,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    let unevaluated = match &node.unevaluated_properties {
        Some(unevaluated) => unevaluated,
        None => return,
    };
    let leftover: Vec<&String> = map
        .keys()
        .filter(|key| !key_evaluated(node, key))
        .collect();
    match unevaluated {
        BoolOrSchema::Bool(true) => {}
        BoolOrSchema::Bool(false) => {
            if !leftover.is_empty() {
                sink.push(ValidationError::unevaluated_properties(
                    path.into(),
                    instance,
                    leftover.into_iter().cloned().collect(),
                ));
            }
        }
        BoolOrSchema::Schema(schema) => {
            for key in leftover {
                if let Some(value) = map.get(key) {
                    let _guard = path.descend(key.as_str());
                    validate_node(schema, value, path, sink);
                }
            }
        }
    }
}

fn declared(node: &SchemaNode, key: &str) -> bool {
    node.properties.iter().any(|(name, _)| name == key)
}

fn pattern_covered(node: &SchemaNode, key: &str) -> bool {
    node.pattern_properties
        .iter()
        .any(|property| patterns::is_match(&property.matcher, key))
}

/// Whether this node or one of its in-place applicators (`allOf`,
/// `if`/`then`/`else`) declares the key.
fn key_evaluated(node: &SchemaNode, key: &str) -> bool {
    if declared(node, key) || pattern_covered(node, key) {
        return true;
    }
    if let Some(children) = &node.all_of {
        if children
            .iter()
            .any(|child| key_evaluated(&child.inner, key))
        {
            return true;
        }
    }
    for conditional in [&node.if_, &node.then_, &node.else_].iter().copied().flatten() {
        if key_evaluated(&conditional.inner, key) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use crate::Compiler;
    use crate::error::ValidationErrorKind;
    use serde_json::json;

    #[test]
    fn additional_properties_false_lists_offenders() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "additionalProperties": false
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        let errors = compiled.validate(&json!({"a": "x", "b": 1})).unwrap_err();
        assert_eq!(errors.len(), 1);
        match &errors.iter().next().unwrap().kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                assert_eq!(unexpected, &vec!["b".to_string()]);
            }
            kind => panic!("unexpected kind: {:?}", kind),
        }
    }

    #[test]
    fn pattern_properties_cover_additional() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}},
            "patternProperties": {"^x-": {"type": "integer"}},
            "additionalProperties": false
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!({"a": "v", "x-trace": 7})).is_ok());
        assert!(compiled.validate(&json!({"a": "v", "x-trace": "no"})).is_err());
        assert!(compiled.validate(&json!({"a": "v", "other": 7})).is_err());
    }

    #[test]
    fn required_is_satisfied_by_defaults() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string", "default": "anonymous"}}
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!({})).is_ok());
    }

    #[test]
    fn dependent_required() {
        let schema = json!({
            "type": "object",
            "dependentRequired": {"credit_card": ["billing_address"]}
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!({"credit_card": "4111"})).is_err());
        assert!(compiled
            .validate(&json!({"credit_card": "4111", "billing_address": "x"}))
            .is_ok());
        assert!(compiled.validate(&json!({"name": "n"})).is_ok());
    }

    #[test]
    fn property_names_are_validated() {
        let schema = json!({"propertyNames": {"maxLength": 3}});
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!({"abc": 1})).is_ok());
        assert!(compiled.validate(&json!({"abcd": 1})).is_err());
    }

    #[test]
    fn unevaluated_properties_false() {
        let schema = json!({
            "allOf": [
                {"properties": {"a": {"type": "string"}}}
            ],
            "properties": {"b": {"type": "integer"}},
            "unevaluatedProperties": false
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!({"a": "x", "b": 1})).is_ok());
        assert!(compiled.validate(&json!({"a": "x", "c": true})).is_err());
    }
}
