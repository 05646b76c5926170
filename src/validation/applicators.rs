//! Applicator keywords: `allOf`, `anyOf`, `oneOf` (with the discriminator
//! shortcut), `not`, `if`/`then`/`else` and `dependentSchemas`.
use super::{is_valid, validate_node, ErrorSink};
use crate::{
    error::ValidationError,
    paths::InstancePath,
    schema::{Discriminator, Schema},
};
use serde_json::Value;

pub(super) fn validate_applicators(
    schema: &Schema,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    let node = &*schema.inner;
    if let Some(children) = &node.all_of {
        for child in children {
            validate_node(child, instance, path, sink);
            if sink.saturated() {
                return;
            }
        }
    }
    if let Some(children) = &node.any_of {
        if !children.iter().any(|child| is_valid(child, instance)) {
            sink.push(ValidationError::any_of(path.into(), instance));
        }
    }
    if let Some(children) = &node.one_of {
        match &node.discriminator {
            // The discriminator picks the single candidate; only that one
            // is evaluated
            Some(discriminator) => {
                validate_discriminated(discriminator, children, instance, path, sink);
            }
            None => {
                let valid: Vec<usize> = children
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| is_valid(child, instance))
                    .map(|(index, _)| index)
                    .collect();
                match valid.len() {
                    0 => sink.push(ValidationError::one_of_not_valid(path.into(), instance)),
                    1 => {}
                    _ => sink.push(ValidationError::one_of_multiple_valid(
                        path.into(),
                        instance,
                        valid,
                    )),
                }
            }
        }
    }
    if let Some(not) = &node.not {
        if is_valid(not, instance) {
            sink.push(ValidationError::not(
                path.into(),
                instance,
                not.inner.raw.clone(),
            ));
        }
    }
    if let Some(if_) = &node.if_ {
        if is_valid(if_, instance) {
            // A missing `then` adds no constraint on the positive branch
            if let Some(then_) = &node.then_ {
                validate_node(then_, instance, path, sink);
            }
        } else if let Some(else_) = &node.else_ {
            validate_node(else_, instance, path, sink);
        }
    }
    if let Value::Object(map) = instance {
        for (name, subschema) in &node.dependent_schemas {
            if map.contains_key(name) {
                validate_node(subschema, instance, path, sink);
            }
        }
    }
}

fn validate_discriminated(
    discriminator: &Discriminator,
    children: &[Schema],
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    let value = match instance {
        Value::Object(map) => map
            .get(&discriminator.property_name)
            .and_then(Value::as_str)
            .unwrap_or(""),
        _ => "",
    };
    let selected = children
        .iter()
        .find(|candidate| matches_discriminator(candidate, discriminator, value));
    match selected {
        Some(candidate) => validate_node(candidate, instance, path, sink),
        None => sink.push(ValidationError::discriminator(path.into(), instance, value)),
    }
}

/// With a mapping, the selected target names the candidate's `$id`, `$ref`
/// or anchor. Without one, the candidate's own `const`/`enum` tag for the
/// discriminator property decides.
fn matches_discriminator(
    candidate: &Schema,
    discriminator: &Discriminator,
    value: &str,
) -> bool {
    let node = &*candidate.inner;
    if let Some(mapping) = &discriminator.mapping {
        let target = match mapping.get(value) {
            Some(target) => target.as_str(),
            None => return false,
        };
        return node.reference.as_deref() == Some(target)
            || node.anchor.as_deref() == Some(target.trim_start_matches('#'))
            || node
                .id
                .as_deref()
                .map_or(false, |id| id == target || id.ends_with(target));
    }
    if let Some(property) = candidate.property(&discriminator.property_name) {
        if let Some(expected) = &property.inner.const_ {
            return expected.as_str() == Some(value);
        }
        if let Some(options) = &property.inner.enum_ {
            return options.iter().any(|option| option.as_str() == Some(value));
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use crate::Compiler;
    use crate::error::ValidationErrorKind;
    use serde_json::json;

    fn people_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "discriminator": {"propertyName": "position"},
            "oneOf": [
                {
                    "type": "object",
                    "properties": {
                        "position": {"const": "Manager"},
                        "subordinates": {"type": "array", "items": {"type": "string"}}
                    }
                },
                {
                    "type": "object",
                    "properties": {
                        "position": {"const": "Developer"},
                        "languages": {"type": "array", "items": {"type": "string"}}
                    }
                }
            ]
        })
    }

    #[test]
    fn discriminator_selects_one_branch() {
        let compiled = Compiler::new().compile_value(&people_schema()).unwrap();
        assert!(compiled
            .validate(&json!({"position": "Manager", "subordinates": ["u1"]}))
            .is_ok());
        assert!(compiled
            .validate(&json!({"position": "Developer", "languages": ["rust"]}))
            .is_ok());
        // The Manager branch is the only one consulted, so a Developer
        // payload under a Manager tag fails on the Manager shape
        assert!(compiled
            .validate(&json!({"position": "Manager", "subordinates": [1]}))
            .is_err());
    }

    #[test]
    fn unknown_discriminator_value_names_itself() {
        let compiled = Compiler::new().compile_value(&people_schema()).unwrap();
        let errors = compiled.validate(&json!({"position": "Analyst"})).unwrap_err();
        assert_eq!(errors.len(), 1);
        let error = errors.iter().next().unwrap();
        assert!(matches!(
            &error.kind,
            ValidationErrorKind::Discriminator { value } if value == "Analyst"
        ));
        assert!(error.to_string().contains("Analyst"));
    }

    #[test]
    fn discriminator_mapping_targets_refs() {
        let schema = json!({
            "type": "object",
            "$defs": {
                "cat": {"type": "object", "properties": {"kind": {"const": "cat"}, "lives": {"type": "integer"}}},
                "dog": {"type": "object", "properties": {"kind": {"const": "dog"}, "good": {"type": "boolean"}}}
            },
            "discriminator": {
                "propertyName": "kind",
                "mapping": {"cat": "#/$defs/cat", "dog": "#/$defs/dog"}
            },
            "oneOf": [
                {"$ref": "#/$defs/cat"},
                {"$ref": "#/$defs/dog"}
            ]
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!({"kind": "cat", "lives": 9})).is_ok());
        assert!(compiled.validate(&json!({"kind": "dog", "good": true})).is_ok());
        assert!(compiled.validate(&json!({"kind": "dog", "good": "yes"})).is_err());
    }

    #[test]
    fn one_of_counts_without_discriminator() {
        let schema = json!({
            "oneOf": [
                {"type": "integer", "minimum": 0},
                {"type": "integer", "maximum": 10}
            ]
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        // 5 matches both branches
        let errors = compiled.validate(&json!(5)).unwrap_err();
        assert!(matches!(
            &errors.iter().next().unwrap().kind,
            ValidationErrorKind::OneOfMultipleValid { valid } if valid == &vec![0, 1]
        ));
        assert!(compiled.validate(&json!(-3)).is_ok());
    }

    #[test]
    fn conditional_branches() {
        let schema = json!({
            "if": {"properties": {"kind": {"const": "number"}}, "required": ["kind"]},
            "then": {"properties": {"value": {"type": "number"}}},
            "else": {"properties": {"value": {"type": "string"}}}
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!({"kind": "number", "value": 3})).is_ok());
        assert!(compiled.validate(&json!({"kind": "number", "value": "x"})).is_err());
        assert!(compiled.validate(&json!({"kind": "text", "value": "x"})).is_ok());
    }

    #[test]
    fn not_applicator() {
        let schema = json!({"not": {"type": "string"}});
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!(5)).is_ok());
        assert!(compiled.validate(&json!("text")).is_err());
    }

    #[test]
    fn dependent_schemas() {
        let schema = json!({
            "dependentSchemas": {
                "credit_card": {"required": ["billing_address"]}
            }
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!({"credit_card": "4111"})).is_err());
        assert!(compiled
            .validate(&json!({"credit_card": "4111", "billing_address": "a"}))
            .is_ok());
    }
}
