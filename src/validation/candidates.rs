//! The candidate-type loop: type compatibility with coercion acceptance,
//! then the simple constraints for the matching variant.
use super::{array, helpers, object, validate_node, ErrorSink};
use crate::{
    content,
    error::ValidationError,
    formats,
    paths::InstancePath,
    patterns,
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
    schema::{Schema, SchemaNode},
};
use serde_json::{Number, Value};

pub(super) fn check_candidates(
    schema: &Schema,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    let node = &*schema.inner;
    if let Some(options) = &node.enum_ {
        if !options.iter().any(|option| helpers::equal(instance, option)) {
            sink.push(ValidationError::enumeration(
                path.into(),
                instance,
                &Value::Array(options.clone()),
            ));
        }
    }
    if let Some(expected) = &node.const_ {
        if !helpers::equal(instance, expected) {
            sink.push(ValidationError::constant(path.into(), instance, expected));
        }
    }
    let actual = PrimitiveType::of(instance);
    if node.types.is_empty() {
        // No declared candidates: the constraints for the actual variant
        // apply, nothing else
        check_variant(schema, actual, instance, path, sink);
        return;
    }
    let mut failures: Vec<(PrimitiveType, Vec<ValidationError>)> = Vec::new();
    for candidate in node.types {
        if !type_compatible(node, candidate, instance) {
            continue;
        }
        let mut local = ErrorSink::new(false);
        check_variant(schema, candidate, instance, path, &mut local);
        if local.is_empty() {
            return;
        }
        failures.push((candidate, local.into_errors()));
    }
    match failures.len() {
        // No candidate accepted even the shape of the instance
        0 => sink.push(ValidationError::type_mismatch(
            path.into(),
            instance,
            node.types,
            actual,
            Vec::new(),
        )),
        // One candidate matched the shape; its violations are the report
        1 => {
            let (_, errors) = failures.pop().expect("Checked length");
            sink.extend(errors);
        }
        _ => sink.push(ValidationError::type_mismatch(
            path.into(),
            instance,
            node.types,
            actual,
            failures,
        )),
    }
}

/// Type compatibility, including the coercion acceptance rules: a numeric
/// string satisfies number/integer, and a string satisfies object when a
/// `contentEncoding` tells how to unwrap it.
fn type_compatible(node: &SchemaNode, candidate: PrimitiveType, instance: &Value) -> bool {
    match candidate {
        PrimitiveType::Null => instance.is_null(),
        PrimitiveType::Boolean => instance.is_boolean(),
        PrimitiveType::Integer => match instance {
            Value::Number(number) => helpers::is_integer(number),
            Value::String(text) => integral_string(text).is_some(),
            _ => false,
        },
        PrimitiveType::Number => match instance {
            Value::Number(_) => true,
            Value::String(text) => numeric_string(text).is_some(),
            _ => false,
        },
        PrimitiveType::String => instance.is_string(),
        PrimitiveType::Array => instance.is_array(),
        PrimitiveType::Object => {
            instance.is_object()
                || (instance.is_string() && node.content_encoding.is_some())
        }
    }
}

/// Constraints for one variant. The caller established compatibility (or,
/// for untyped schemas, passes the actual variant).
fn check_variant(
    schema: &Schema,
    candidate: PrimitiveType,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    let node = &*schema.inner;
    match candidate {
        PrimitiveType::Null | PrimitiveType::Boolean => {}
        PrimitiveType::Integer | PrimitiveType::Number => {
            check_numeric(node, candidate, instance, path, sink);
        }
        PrimitiveType::String => check_string(node, instance, path, sink),
        PrimitiveType::Array => {
            if let Value::Array(items) = instance {
                array::check_array(node, items, instance, path, sink);
            }
        }
        PrimitiveType::Object => check_object_variant(node, instance, path, sink),
    }
}

fn check_numeric(
    node: &SchemaNode,
    candidate: PrimitiveType,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    let number = match instance {
        Value::Number(number) => number.clone(),
        Value::String(text) => {
            let parsed = if candidate == PrimitiveType::Integer {
                integral_string(text)
            } else {
                numeric_string(text)
            };
            match parsed {
                Some(number) => number,
                None => {
                    sink.push(ValidationError::coercion(path.into(), instance, candidate));
                    return;
                }
            }
        }
        _ => return,
    };
    if let Some(multiple_of) = node.multiple_of {
        let value = number.as_f64().expect("Always valid");
        if (value / multiple_of).fract() != 0.0 {
            sink.push(ValidationError::multiple_of(path.into(), instance, multiple_of));
        }
    }
    if let Some(limit) = node.maximum {
        if !helpers::num_le(&number, limit) {
            sink.push(ValidationError::maximum(path.into(), instance, limit));
        }
    }
    if let Some(limit) = node.exclusive_maximum {
        if !helpers::num_lt(&number, limit) {
            sink.push(ValidationError::exclusive_maximum(path.into(), instance, limit));
        }
    }
    if let Some(limit) = node.minimum {
        if !helpers::num_ge(&number, limit) {
            sink.push(ValidationError::minimum(path.into(), instance, limit));
        }
    }
    if let Some(limit) = node.exclusive_minimum {
        if !helpers::num_gt(&number, limit) {
            sink.push(ValidationError::exclusive_minimum(path.into(), instance, limit));
        }
    }
}

fn check_string(
    node: &SchemaNode,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    let text = match instance {
        Value::String(text) => text,
        _ => return,
    };
    if let Some(limit) = node.min_length {
        if (bytecount::num_chars(text.as_bytes()) as u64) < limit {
            sink.push(ValidationError::min_length(path.into(), instance, limit));
        }
    }
    if let Some(limit) = node.max_length {
        if (bytecount::num_chars(text.as_bytes()) as u64) > limit {
            sink.push(ValidationError::max_length(path.into(), instance, limit));
        }
    }
    if let Some((pattern, matcher)) = &node.pattern {
        if !patterns::is_match(matcher, text) {
            sink.push(ValidationError::pattern(path.into(), instance, pattern.clone()));
        }
    }
    if let Some(format) = &node.format {
        // Formats without a registered validator are annotations
        if let Some(check) = formats::lookup(format) {
            if !check(text) {
                sink.push(ValidationError::format(path.into(), instance, format));
            }
        }
    }
    check_content(node, text, instance, path, sink);
}

fn check_content(
    node: &SchemaNode,
    text: &str,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    let mut decoded: Option<String> = None;
    if let Some(encoding) = &node.content_encoding {
        if let Some((check, convert)) =
            content::CONTENT_ENCODING_CHECKS_AND_CONVERTERS.get(encoding.as_str())
        {
            if !check(text) {
                sink.push(ValidationError::content_encoding(path.into(), instance, encoding));
                return;
            }
            match convert(text) {
                Some(converted) => decoded = Some(converted),
                None => {
                    sink.push(ValidationError::content_encoding(
                        path.into(),
                        instance,
                        encoding,
                    ));
                    return;
                }
            }
        }
    }
    let effective = decoded.as_deref().unwrap_or(text);
    if let Some(media_type) = &node.content_media_type {
        if let Some(check) = content::CONTENT_MEDIA_TYPE_CHECKS.get(media_type.as_str()) {
            if !check(effective) {
                sink.push(ValidationError::content_media_type(
                    path.into(),
                    instance,
                    media_type,
                ));
                return;
            }
        }
    }
    if let Some(content_schema) = &node.content_schema {
        if node.content_media_type.as_deref() == Some("application/json") {
            if let Some(parsed) = content::parse_json(effective) {
                validate_node(content_schema, &parsed, path, sink);
            }
        }
    }
}

/// An object candidate accepts objects directly and, when a
/// `contentEncoding` is declared, strings that decode into JSON objects.
fn check_object_variant(
    node: &SchemaNode,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    match instance {
        Value::Object(map) => object::check_object(node, map, instance, path, sink),
        Value::String(text) => {
            let encoding = match &node.content_encoding {
                Some(encoding) => encoding,
                None => return,
            };
            let decoded = content::CONTENT_ENCODING_CHECKS_AND_CONVERTERS
                .get(encoding.as_str())
                .and_then(|(_, convert)| convert(text));
            let decoded = match decoded {
                Some(decoded) => decoded,
                None => {
                    sink.push(ValidationError::content_encoding(
                        path.into(),
                        instance,
                        encoding,
                    ));
                    return;
                }
            };
            match content::parse_json(&decoded) {
                Some(parsed @ Value::Object(_)) => {
                    let map = parsed.as_object().expect("Checked above");
                    object::check_object(node, map, &parsed, path, sink);
                }
                _ => sink.push(ValidationError::content_media_type(
                    path.into(),
                    instance,
                    "application/json",
                )),
            }
        }
        _ => {}
    }
}

fn integral_string(text: &str) -> Option<Number> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(Number::from(value));
    }
    let value: f64 = text.parse().ok()?;
    if value.is_finite() && value.fract() == 0.0 {
        Number::from_f64(value)
    } else {
        None
    }
}

fn numeric_string(text: &str) -> Option<Number> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(Number::from(value));
    }
    let value: f64 = text.parse().ok()?;
    if value.is_finite() {
        Number::from_f64(value)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::Compiler;
    use crate::error::ValidationErrorKind;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(json!({"type": "integer"}), json!(3), true)]
    #[test_case(json!({"type": "integer"}), json!(3.0), true ; "integral float")]
    #[test_case(json!({"type": "integer"}), json!(3.5), false)]
    #[test_case(json!({"type": "integer"}), json!("3"), true ; "numeric string coerces")]
    #[test_case(json!({"type": "integer"}), json!("3.7"), false)]
    #[test_case(json!({"type": "number"}), json!("3.7"), true)]
    #[test_case(json!({"type": "string"}), json!(3), false)]
    #[test_case(json!({"type": ["integer", "string"]}), json!("x"), true)]
    #[test_case(json!({"type": "null"}), json!(null), true)]
    #[test_case(json!({"type": "boolean"}), json!(true), true)]
    fn type_candidates(schema: serde_json::Value, instance: serde_json::Value, valid: bool) {
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert_eq!(compiled.validate(&instance).is_ok(), valid);
    }

    #[test]
    fn single_shape_match_surfaces_constraint_errors() {
        let schema = json!({
            "type": ["integer", "string"],
            "minimum": 10
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        let errors = compiled.validate(&json!(3)).unwrap_err();
        assert!(matches!(
            errors.iter().next().unwrap().kind,
            ValidationErrorKind::Minimum { .. }
        ));
    }

    #[test]
    fn no_shape_match_reports_type_mismatch() {
        let schema = json!({"type": ["integer", "boolean"]});
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        let errors = compiled.validate(&json!("text")).unwrap_err();
        assert!(matches!(
            errors.iter().next().unwrap().kind,
            ValidationErrorKind::TypeMismatch { .. }
        ));
    }

    #[test]
    fn numeric_constraints() {
        let schema = json!({
            "type": "number",
            "minimum": 0,
            "exclusiveMaximum": 100,
            "multipleOf": 0.5
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!(99.5)).is_ok());
        assert!(compiled.validate(&json!(100)).is_err());
        assert!(compiled.validate(&json!(-1)).is_err());
        assert!(compiled.validate(&json!(0.3)).is_err());
    }

    #[test]
    fn string_constraints() {
        let schema = json!({
            "type": "string",
            "minLength": 2,
            "maxLength": 5,
            "pattern": "^[a-z]+$"
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!("abc")).is_ok());
        assert!(compiled.validate(&json!("a")).is_err());
        assert!(compiled.validate(&json!("toolong")).is_err());
        assert!(compiled.validate(&json!("UPPER")).is_err());
        // length counts characters, not bytes
        assert!(compiled.validate(&json!("héllo")).is_ok());
    }

    #[test]
    fn format_validation() {
        let schema = json!({"type": "string", "format": "ipv4"});
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!("127.0.0.1")).is_ok());
        assert!(compiled.validate(&json!("999.0.0.1")).is_err());
        // unregistered formats are annotations
        let open = Compiler::new()
            .compile_value(&json!({"type": "string", "format": "my-custom"}))
            .unwrap();
        assert!(open.validate(&json!("anything")).is_ok());
    }

    #[test]
    fn base64_encoded_object() {
        // {"a": 1} base64-encoded
        let schema = json!({
            "type": "object",
            "contentEncoding": "base64",
            "contentMediaType": "application/json"
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!("eyJhIjogMX0=")).is_ok());
        assert!(compiled.validate(&json!("not base64!")).is_err());
    }

    #[test]
    fn content_schema_applies_to_decoded_json() {
        let schema = json!({
            "type": "string",
            "contentMediaType": "application/json",
            "contentSchema": {"type": "object", "required": ["a"]}
        });
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!("{\"a\": 1}")).is_ok());
        assert!(compiled.validate(&json!("{\"b\": 1}")).is_err());
    }

    #[test]
    fn enum_and_const_use_deep_equality() {
        let compiled = Compiler::new()
            .compile_value(&json!({"enum": [[1, 2], {"a": 1}, "x"]}))
            .unwrap();
        assert!(compiled.validate(&json!([1, 2])).is_ok());
        assert!(compiled.validate(&json!([1.0, 2.0])).is_ok());
        assert!(compiled.validate(&json!({"a": 1})).is_ok());
        assert!(compiled.validate(&json!([2, 1])).is_err());
        let constant = Compiler::new()
            .compile_value(&json!({"const": {"a": [1]}}))
            .unwrap();
        assert!(constant.validate(&json!({"a": [1.0]})).is_ok());
        assert!(constant.validate(&json!({"a": [2]})).is_err());
    }
}
