//! `unmarshal`: produce a coerced, default-filled copy of an instance.
//!
//! Declared properties recurse, absent ones take their (recursively
//! coerced) defaults, extras follow the `additionalProperties` policy.
//! Numeric strings become numbers for numeric candidates and base64
//! content is decoded. The input value is never mutated.
use crate::{
    content,
    error::{ValidationError, ValidationErrors},
    paths::InstancePath,
    patterns,
    primitive_type::PrimitiveType,
    resolver,
    schema::{BoolOrSchema, Schema, SchemaNode},
};
use serde_json::{Map, Number, Value};
use std::sync::Arc;

pub(crate) fn unmarshal(schema: &Schema, instance: &Value) -> Result<Value, ValidationErrors> {
    let mut errors = Vec::new();
    let path = InstancePath::new();
    let value = coerce_value(schema, instance, &path, &mut errors);
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(ValidationErrors(errors))
    }
}

fn coerce_value(
    schema: &Schema,
    instance: &Value,
    path: &InstancePath,
    errors: &mut Vec<ValidationError>,
) -> Value {
    let node = &*schema.inner;
    if node.boolean.is_some() {
        return instance.clone();
    }
    // References first, mirroring validation order
    if let Some(reference) = &node.reference {
        if let Ok(target) = resolver::resolve_reference(schema, reference) {
            if !Arc::ptr_eq(&target.inner, &schema.inner) {
                return coerce_value(&target, instance, path, errors);
            }
        }
    }
    if let Some(reference) = &node.dynamic_reference {
        if let Ok(target) = resolver::resolve_dynamic(schema, reference) {
            if !Arc::ptr_eq(&target.inner, &schema.inner) {
                return coerce_value(&target, instance, path, errors);
            }
        }
    }
    if node.recursive_reference.is_some() {
        if let Ok(target) = resolver::resolve_recursive(schema) {
            if !Arc::ptr_eq(&target.inner, &schema.inner) {
                return coerce_value(&target, instance, path, errors);
            }
        }
    }
    let mut result = match instance {
        Value::Object(map) => coerce_object(node, map, path, errors),
        Value::Array(items) => coerce_array(node, items, path, errors),
        Value::String(text) => coerce_scalar(node, text, instance, path, errors),
        _ => instance.clone(),
    };
    // Defaults declared inside `allOf` branches still apply to the merged
    // output
    if let Some(children) = &node.all_of {
        for child in children {
            let branch = coerce_value(child, instance, path, errors);
            merge_missing(&mut result, branch);
        }
    }
    result
}

fn merge_missing(result: &mut Value, branch: Value) {
    if let (Value::Object(result_map), Value::Object(branch_map)) = (result, branch) {
        for (key, value) in branch_map {
            result_map.entry(key).or_insert(value);
        }
    }
}

fn coerce_object(
    node: &SchemaNode,
    map: &Map<String, Value>,
    path: &InstancePath,
    errors: &mut Vec<ValidationError>,
) -> Value {
    let mut output = Map::new();
    for (name, property) in &node.properties {
        if let Some(value) = map.get(name) {
            let _guard = path.descend(name.as_str());
            output.insert(name.clone(), coerce_value(property, value, path, errors));
        } else if let Some(default) = &property.inner.default {
            let _guard = path.descend(name.as_str());
            output.insert(name.clone(), coerce_value(property, default, path, errors));
        }
    }
    for (key, value) in map {
        if node.properties.iter().any(|(name, _)| name == key) {
            continue;
        }
        let _guard = path.descend(key.as_str());
        if let Some(matching) = node
            .pattern_properties
            .iter()
            .find(|property| patterns::is_match(&property.matcher, key))
        {
            output.insert(key.clone(), coerce_value(&matching.schema, value, path, errors));
        } else {
            match &node.additional_properties {
                // Unconstrained extras are copied verbatim
                None | Some(BoolOrSchema::Bool(true)) => {
                    output.insert(key.clone(), value.clone());
                }
                // Forbidden extras are dropped; validation reports them
                Some(BoolOrSchema::Bool(false)) => {}
                Some(BoolOrSchema::Schema(additional)) => {
                    output.insert(key.clone(), coerce_value(additional, value, path, errors));
                }
            }
        }
    }
    Value::Object(output)
}

fn coerce_array(
    node: &SchemaNode,
    items: &[Value],
    path: &InstancePath,
    errors: &mut Vec<ValidationError>,
) -> Value {
    let prefix_length = node.prefix_items.as_ref().map_or(0, Vec::len);
    let mut output = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let _guard = path.descend(index);
        let coerced = if index < prefix_length {
            let prefix = node
                .prefix_items
                .as_ref()
                .expect("Non-zero prefix length implies prefixItems");
            coerce_value(&prefix[index], item, path, errors)
        } else if let Some(items_schema) = &node.items {
            coerce_value(items_schema, item, path, errors)
        } else if let Some(BoolOrSchema::Schema(unevaluated)) = &node.unevaluated_items {
            coerce_value(unevaluated, item, path, errors)
        } else {
            item.clone()
        };
        output.push(coerced);
    }
    Value::Array(output)
}

fn coerce_scalar(
    node: &SchemaNode,
    text: &str,
    instance: &Value,
    path: &InstancePath,
    errors: &mut Vec<ValidationError>,
) -> Value {
    if node.types.contains_type(PrimitiveType::Integer) {
        if let Ok(value) = text.parse::<i64>() {
            return Value::Number(Number::from(value));
        }
    }
    if node.types.contains_type(PrimitiveType::Number) {
        if let Ok(value) = text.parse::<i64>() {
            return Value::Number(Number::from(value));
        }
        if let Ok(value) = text.parse::<f64>() {
            if let Some(number) = Number::from_f64(value) {
                return Value::Number(number);
            }
        }
    }
    if let Some(encoding) = &node.content_encoding {
        if let Some((_, convert)) =
            content::CONTENT_ENCODING_CHECKS_AND_CONVERTERS.get(encoding.as_str())
        {
            match convert(text) {
                Some(decoded) => {
                    if node.content_media_type.as_deref() == Some("application/json") {
                        if let Some(parsed) = content::parse_json(&decoded) {
                            return parsed;
                        }
                    }
                    return Value::String(decoded);
                }
                None => {
                    errors.push(ValidationError::coercion(
                        path.into(),
                        instance,
                        PrimitiveType::String,
                    ));
                }
            }
        }
    }
    instance.clone()
}
