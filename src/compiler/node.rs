//! Recursive construction of `Schema` nodes from parsed documents.
use super::context::CompilationContext;
use crate::{
    error::CompileError,
    expressions,
    patterns,
    primitive_type::{PrimitiveType, PrimitiveTypesBitMap},
    schema::{BoolOrSchema, Discriminator, PatternProperty, Schema, SchemaNode, Source},
    vocabularies,
};
use ahash::AHashMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::convert::TryFrom;
use std::sync::Arc;

pub(crate) fn compile_node(
    value: &Value,
    context: &CompilationContext,
) -> Result<Schema, CompileError> {
    match value {
        Value::Bool(boolean) => {
            let mut node = SchemaNode {
                boolean: Some(*boolean),
                raw: value.clone(),
                ..SchemaNode::default()
            };
            node.core = RwLock::new(Arc::downgrade(context.core));
            Ok(Schema::from_node(node))
        }
        Value::Object(object) => compile_object(object, value, context),
        _ => Err(context.shape_error("schema")),
    }
}

#[allow(clippy::too_many_lines)]
fn compile_object(
    object: &Map<String, Value>,
    raw: &Value,
    context: &CompilationContext,
) -> Result<Schema, CompileError> {
    let (context, resolved_id) = context.push_scope(object)?;
    let mut node = SchemaNode {
        raw: raw.clone(),
        ..SchemaNode::default()
    };
    node.core = RwLock::new(Arc::downgrade(context.core));

    // Core keywords
    node.id = resolved_id;
    node.schema_uri = string_keyword(object, "$schema", &context)?;
    node.anchor = string_keyword(object, "$anchor", &context)?;
    node.dynamic_anchor = string_keyword(object, "$dynamicAnchor", &context)?;
    node.recursive_anchor = bool_keyword(object, "$recursiveAnchor", &context)?.unwrap_or(false);
    node.comment = string_keyword(object, "$comment", &context)?;
    node.reference = string_keyword(object, "$ref", &context)?;
    node.dynamic_reference = string_keyword(object, "$dynamicRef", &context)?;
    node.recursive_reference = string_keyword(object, "$recursiveRef", &context)?;
    node.format = string_keyword(object, "format", &context)?;
    if let Some(value) = object.get("$vocabulary") {
        let map = value
            .as_object()
            .ok_or_else(|| context.shape_error("$vocabulary"))?;
        let mut vocabulary = AHashMap::with_capacity(map.len());
        for (uri, enabled) in map {
            let enabled = enabled
                .as_bool()
                .ok_or_else(|| context.shape_error("$vocabulary"))?;
            vocabulary.insert(uri.clone(), enabled);
        }
        node.vocabulary = Some(vocabulary);
    }

    // `definitions` is the legacy spelling of `$defs`
    let defs_value = object.get("$defs").or_else(|| object.get("definitions"));
    if let Some(value) = defs_value {
        let map = value
            .as_object()
            .ok_or_else(|| context.shape_error("$defs"))?;
        let child_context = context.with_keyword("$defs");
        for (name, subschema) in map {
            node.defs.insert(
                name.clone(),
                compile_node(subschema, &child_context.with_keyword(name.as_str()))?,
            );
        }
    }

    // Legacy `dependencies` splits by element shape
    if let Some(value) = object.get("dependencies") {
        let map = value
            .as_object()
            .ok_or_else(|| context.shape_error("dependencies"))?;
        let child_context = context.with_keyword("dependencies");
        for (name, entry) in map {
            match entry {
                Value::Array(names) => {
                    node.dependent_required
                        .push((name.clone(), string_list(names, "dependencies", &context)?));
                }
                Value::Object(_) | Value::Bool(_) => {
                    node.dependent_schemas.push((
                        name.clone(),
                        compile_node(entry, &child_context.with_keyword(name.as_str()))?,
                    ));
                }
                _ => return Err(context.shape_error("dependencies")),
            }
        }
    }
    if let Some(value) = object.get("dependentRequired") {
        let map = value
            .as_object()
            .ok_or_else(|| context.shape_error("dependentRequired"))?;
        for (name, entry) in map {
            let names = entry
                .as_array()
                .ok_or_else(|| context.shape_error("dependentRequired"))?;
            node.dependent_required
                .push((name.clone(), string_list(names, "dependentRequired", &context)?));
        }
    }
    if let Some(value) = object.get("dependentSchemas") {
        let map = value
            .as_object()
            .ok_or_else(|| context.shape_error("dependentSchemas"))?;
        let child_context = context.with_keyword("dependentSchemas");
        for (name, entry) in map {
            node.dependent_schemas.push((
                name.clone(),
                compile_node(entry, &child_context.with_keyword(name.as_str()))?,
            ));
        }
    }

    // Composition
    node.all_of = schema_list(object, "allOf", &context)?;
    node.any_of = schema_list(object, "anyOf", &context)?;
    node.one_of = schema_list(object, "oneOf", &context)?;
    node.prefix_items = schema_list(object, "prefixItems", &context)?;
    node.not = schema_keyword(object, "not", &context)?;
    node.if_ = schema_keyword(object, "if", &context)?;
    node.then_ = schema_keyword(object, "then", &context)?;
    node.else_ = schema_keyword(object, "else", &context)?;

    // Object shape
    if let Some(value) = object.get("properties") {
        let map = value
            .as_object()
            .ok_or_else(|| context.shape_error("properties"))?;
        let child_context = context.with_keyword("properties");
        node.has_properties = true;
        node.properties.reserve(map.len());
        for (name, subschema) in map {
            node.properties.push((
                name.clone(),
                compile_node(subschema, &child_context.with_keyword(name.as_str()))?,
            ));
        }
    }
    if let Some(value) = object.get("patternProperties") {
        let map = value
            .as_object()
            .ok_or_else(|| context.shape_error("patternProperties"))?;
        let child_context = context.with_keyword("patternProperties");
        for (pattern, subschema) in map {
            node.pattern_properties.push(PatternProperty {
                pattern: pattern.clone(),
                matcher: patterns::intern(pattern)?,
                schema: compile_node(subschema, &child_context.with_keyword(pattern.as_str()))?,
            });
        }
    }
    node.additional_properties = bool_or_schema(object, "additionalProperties", &context)?;
    node.property_names = schema_keyword(object, "propertyNames", &context)?;
    node.unevaluated_properties = bool_or_schema(object, "unevaluatedProperties", &context)?;
    node.max_properties = u64_keyword(object, "maxProperties", &context)?;
    node.min_properties = u64_keyword(object, "minProperties", &context)?;
    if let Some(value) = object.get("required") {
        let names = value
            .as_array()
            .ok_or_else(|| context.shape_error("required"))?;
        node.required = string_list(names, "required", &context)?;
    }
    if let Some(value) = object.get("discriminator") {
        node.discriminator = Some(compile_discriminator(value)?);
    }

    // Array shape
    match object.get("items") {
        // Array-form `items` is the pre-2020-12 spelling of `prefixItems`
        Some(Value::Array(items)) if node.prefix_items.is_none() => {
            node.prefix_items = Some(compile_children(items, &context.with_keyword("items"))?);
        }
        Some(Value::Array(_)) => {}
        Some(value) => node.items = Some(compile_node(value, &context.with_keyword("items"))?),
        None => {}
    }
    node.unevaluated_items = bool_or_schema(object, "unevaluatedItems", &context)?;
    node.contains = schema_keyword(object, "contains", &context)?;
    node.max_items = u64_keyword(object, "maxItems", &context)?;
    node.min_items = u64_keyword(object, "minItems", &context)?;
    node.unique_items = bool_keyword(object, "uniqueItems", &context)?.unwrap_or(false);
    node.max_contains = u64_keyword(object, "maxContains", &context)?;
    node.min_contains = u64_keyword(object, "minContains", &context)?;

    // Scalar constraints
    if let Some(value) = object.get("type") {
        node.types = compile_types(value, &context)?;
    }
    if let Some(value) = object.get("enum") {
        let options = value
            .as_array()
            .ok_or_else(|| context.shape_error("enum"))?;
        node.enum_ = Some(options.clone());
    }
    if let Some(value) = object.get("const") {
        node.const_ = Some(value.clone());
    }
    node.multiple_of = f64_keyword(object, "multipleOf", &context)?;
    node.maximum = f64_keyword(object, "maximum", &context)?;
    node.exclusive_maximum = f64_keyword(object, "exclusiveMaximum", &context)?;
    node.minimum = f64_keyword(object, "minimum", &context)?;
    node.exclusive_minimum = f64_keyword(object, "exclusiveMinimum", &context)?;
    node.max_length = u64_keyword(object, "maxLength", &context)?;
    node.min_length = u64_keyword(object, "minLength", &context)?;
    if let Some(pattern) = string_keyword(object, "pattern", &context)? {
        let matcher = patterns::intern(&pattern)?;
        node.pattern = Some((pattern, matcher));
    }

    // Content
    node.content_encoding = string_keyword(object, "contentEncoding", &context)?;
    node.content_media_type = string_keyword(object, "contentMediaType", &context)?;
    node.content_schema = schema_keyword(object, "contentSchema", &context)?;

    // Documentation and binding
    node.title = string_keyword(object, "title", &context)?;
    node.description = string_keyword(object, "description", &context)?;
    node.deprecated = bool_keyword(object, "deprecated", &context)?.unwrap_or(false);
    node.read_only = bool_keyword(object, "readOnly", &context)?.unwrap_or(false);
    node.write_only = bool_keyword(object, "writeOnly", &context)?.unwrap_or(false);
    if let Some(value) = object.get("examples") {
        let examples = value
            .as_array()
            .ok_or_else(|| context.shape_error("examples"))?;
        node.examples = Some(examples.clone());
    }
    if let Some(value) = object.get("default") {
        node.default = Some(compile_default(value, &context)?);
    }
    if let Some(value) = object.get("in") {
        let names = value.as_array().ok_or_else(|| context.shape_error("in"))?;
        for name in names {
            let name = name.as_str().ok_or_else(|| context.shape_error("in"))?;
            let source =
                Source::try_from(name).map_err(|_| context.shape_error("in"))?;
            node.sources.push(source);
        }
    }
    node.field = string_keyword(object, "field", &context)?;

    extend_required(&mut node);
    finalize_types(&mut node);
    self_validate(&node, object)?;

    Ok(Schema::from_node(node))
}

/// Parse the `type` keyword. An explicit `array` candidate outranks any
/// other explicit candidate.
fn compile_types(
    value: &Value,
    context: &CompilationContext,
) -> Result<PrimitiveTypesBitMap, CompileError> {
    let mut types = PrimitiveTypesBitMap::new();
    match value {
        Value::String(name) => {
            types = types.add_type(parse_type(name, context)?);
        }
        Value::Array(names) => {
            if names.is_empty() {
                return Err(context.shape_error("type"));
            }
            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| context.shape_error("type"))?;
                types = types.add_type(parse_type(name, context)?);
            }
        }
        _ => return Err(context.shape_error("type")),
    }
    if types.contains_type(PrimitiveType::Array) && types.len() > 1 {
        types = PrimitiveTypesBitMap::new().add_type(PrimitiveType::Array);
    }
    Ok(types)
}

fn parse_type(name: &str, context: &CompilationContext) -> Result<PrimitiveType, CompileError> {
    PrimitiveType::try_from(name).map_err(|_| context.shape_error("type"))
}

/// A `{{ … }}` string default goes through the expression adapter; with no
/// adapter registered the literal survives.
fn compile_default(value: &Value, context: &CompilationContext) -> Result<Value, CompileError> {
    if let Value::String(text) = value {
        if let Some(source) = expressions::template_source(text) {
            return match expressions::evaluate(source) {
                Some(Ok(computed)) => Ok(computed),
                Some(Err(_)) => Err(context.shape_error("default")),
                None => Ok(value.clone()),
            };
        }
    }
    Ok(value.clone())
}

fn compile_discriminator(value: &Value) -> Result<Discriminator, CompileError> {
    let map = value.as_object().ok_or_else(|| CompileError::Discriminator {
        reason: "must be an object".to_string(),
    })?;
    let property_name = map
        .get("propertyName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CompileError::Discriminator {
            reason: "propertyName must be a non-empty string".to_string(),
        })?
        .to_string();
    let mapping = match map.get("mapping") {
        None => None,
        Some(value) => {
            let entries = value.as_object().ok_or_else(|| CompileError::Discriminator {
                reason: "mapping must be an object".to_string(),
            })?;
            let mut mapping = AHashMap::with_capacity(entries.len());
            for (key, target) in entries {
                let target = target.as_str().ok_or_else(|| CompileError::Discriminator {
                    reason: "mapping values must be strings".to_string(),
                })?;
                mapping.insert(key.clone(), target.to_string());
            }
            Some(mapping)
        }
    };
    Ok(Discriminator {
        property_name,
        mapping,
    })
}

/// Properties sourced from outside the body are implicitly required, and an
/// `if.required` entry whose `then` branch tightens the nested property's
/// own `required` set is promoted as well.
fn extend_required(node: &mut SchemaNode) {
    let mut required = std::mem::take(&mut node.required);
    for (name, property) in &node.properties {
        if property
            .inner
            .sources
            .iter()
            .any(|source| *source != Source::Body)
            && !required.contains(name)
        {
            required.push(name.clone());
        }
    }
    if let (Some(if_), Some(then_)) = (&node.if_, &node.then_) {
        for field in &if_.inner.required {
            if required.contains(field) {
                continue;
            }
            if let Some(then_property) = then_.property(field) {
                let base = node
                    .properties
                    .iter()
                    .find(|(name, _)| name == field)
                    .map(|(_, schema)| schema.inner.required.as_slice())
                    .unwrap_or(&[]);
                if then_property
                    .inner
                    .required
                    .iter()
                    .any(|name| !base.contains(name))
                {
                    required.push(field.clone());
                }
            }
        }
    }
    node.required = required;
}

/// Infer `type` when it is still empty at the end of compilation.
fn finalize_types(node: &mut SchemaNode) {
    if !node.types.is_empty() {
        return;
    }
    let mut types = PrimitiveTypesBitMap::new();
    if node.has_properties || node.if_.is_some() || node.then_.is_some() || node.else_.is_some() {
        types = types.add_type(PrimitiveType::Object);
    } else if node.pattern.is_some() {
        types = types.add_type(PrimitiveType::String);
    } else if node.minimum.is_some()
        || node.maximum.is_some()
        || node.exclusive_minimum.is_some()
        || node.exclusive_maximum.is_some()
    {
        types = types.add_type(PrimitiveType::Number);
    } else if node.min_items.is_some() || node.max_items.is_some() {
        types = types.add_type(PrimitiveType::Array);
    } else {
        for group in [&node.one_of, &node.any_of].iter().copied().flatten() {
            for child in group.iter() {
                types = types.union(child.inner.types);
            }
        }
    }
    node.types = types;
}

/// Enforce the rules of declared vocabularies, then run every registered
/// vocabulary validator the schema enables.
fn self_validate(node: &SchemaNode, object: &Map<String, Value>) -> Result<(), CompileError> {
    let vocabulary = match &node.vocabulary {
        Some(vocabulary) => vocabulary,
        None => return Ok(()),
    };
    let meta_data_enabled = vocabulary
        .iter()
        .any(|(uri, enabled)| *enabled && uri.ends_with("/vocab/meta-data"));
    if meta_data_enabled {
        if let Some(title) = &node.title {
            if title.is_empty() {
                return Err(CompileError::SelfValidation {
                    reason: "title must not be empty".to_string(),
                });
            }
        }
    }
    for (uri, enabled) in vocabulary {
        if !*enabled {
            continue;
        }
        if let Some(check) = vocabularies::lookup(uri) {
            check(object).map_err(|reason| CompileError::SelfValidation { reason })?;
        }
    }
    Ok(())
}

fn string_keyword(
    object: &Map<String, Value>,
    keyword: &str,
    context: &CompilationContext,
) -> Result<Option<String>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(context.shape_error(keyword)),
    }
}

fn bool_keyword(
    object: &Map<String, Value>,
    keyword: &str,
    context: &CompilationContext,
) -> Result<Option<bool>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(_) => Err(context.shape_error(keyword)),
    }
}

fn u64_keyword(
    object: &Map<String, Value>,
    keyword: &str,
    context: &CompilationContext,
) -> Result<Option<u64>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(Value::Number(number)) => number
            .as_u64()
            .map(Some)
            .ok_or_else(|| context.shape_error(keyword)),
        Some(_) => Err(context.shape_error(keyword)),
    }
}

fn f64_keyword(
    object: &Map<String, Value>,
    keyword: &str,
    context: &CompilationContext,
) -> Result<Option<f64>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(Value::Number(number)) => Ok(number.as_f64()),
        Some(_) => Err(context.shape_error(keyword)),
    }
}

fn string_list(
    names: &[Value],
    keyword: &str,
    context: &CompilationContext,
) -> Result<Vec<String>, CompileError> {
    names
        .iter()
        .map(|name| {
            name.as_str()
                .map(str::to_string)
                .ok_or_else(|| context.shape_error(keyword))
        })
        .collect()
}

fn schema_keyword(
    object: &Map<String, Value>,
    keyword: &str,
    context: &CompilationContext,
) -> Result<Option<Schema>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(value @ (Value::Object(_) | Value::Bool(_))) => {
            Ok(Some(compile_node(value, &context.with_keyword(keyword))?))
        }
        Some(_) => Err(context.shape_error(keyword)),
    }
}

fn bool_or_schema(
    object: &Map<String, Value>,
    keyword: &str,
    context: &CompilationContext,
) -> Result<Option<BoolOrSchema>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(BoolOrSchema::Bool(*value))),
        Some(value @ Value::Object(_)) => Ok(Some(BoolOrSchema::Schema(compile_node(
            value,
            &context.with_keyword(keyword),
        )?))),
        Some(_) => Err(context.shape_error(keyword)),
    }
}

fn schema_list(
    object: &Map<String, Value>,
    keyword: &str,
    context: &CompilationContext,
) -> Result<Option<Vec<Schema>>, CompileError> {
    match object.get(keyword) {
        None => Ok(None),
        Some(Value::Array(items)) => {
            Ok(Some(compile_children(items, &context.with_keyword(keyword))?))
        }
        Some(_) => Err(context.shape_error(keyword)),
    }
}

/// Compile the elements of a subschema list, in parallel when the option
/// is on. The compiled order always matches the input order; failures are
/// aggregated per the configured error mode.
fn compile_children(
    items: &[Value],
    context: &CompilationContext,
) -> Result<Vec<Schema>, CompileError> {
    let results: Vec<Result<Schema, CompileError>> =
        if context.core.options.parallel_children() && items.len() > 1 {
            items
                .par_iter()
                .map(|item| compile_node(item, context))
                .collect()
        } else {
            items.iter().map(|item| compile_node(item, context)).collect()
        };
    aggregate(results, context.core.options.error_mode())
}

fn aggregate(
    results: Vec<Result<Schema, CompileError>>,
    error_mode: super::ErrorMode,
) -> Result<Vec<Schema>, CompileError> {
    let mut schemas = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(schema) => schemas.push(schema),
            Err(error) => {
                if error_mode == super::ErrorMode::First {
                    return Err(error);
                }
                errors.push(error);
            }
        }
    }
    if errors.is_empty() {
        Ok(schemas)
    } else if errors.len() == 1 {
        Err(errors.pop().expect("Checked length"))
    } else {
        Err(CompileError::Multiple(errors))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Compiler, CompilerOptions, ErrorMode};
    use crate::error::CompileError;
    use crate::primitive_type::PrimitiveType;
    use serde_json::json;

    #[test]
    fn definitions_aliases_defs() {
        let compiled = Compiler::new()
            .compile_value(&json!({
                "definitions": {"positive": {"type": "integer", "minimum": 1}}
            }))
            .unwrap();
        assert!(compiled.inner.defs.contains_key("positive"));
    }

    #[test]
    fn dependencies_split_by_shape() {
        let compiled = Compiler::new()
            .compile_value(&json!({
                "dependencies": {
                    "credit_card": ["billing_address"],
                    "name": {"required": ["first"]}
                }
            }))
            .unwrap();
        assert_eq!(
            compiled.inner.dependent_required,
            vec![("credit_card".to_string(), vec!["billing_address".to_string()])]
        );
        assert_eq!(compiled.inner.dependent_schemas.len(), 1);
        assert_eq!(compiled.inner.dependent_schemas[0].0, "name");
    }

    #[test]
    fn type_inference() {
        let compiler = Compiler::new();
        let properties = compiler
            .compile_value(&json!({"properties": {"a": true}}))
            .unwrap();
        assert!(properties.inner.types.contains_type(PrimitiveType::Object));
        let pattern = compiler.compile_value(&json!({"pattern": "^a"})).unwrap();
        assert!(pattern.inner.types.contains_type(PrimitiveType::String));
        let bounded = compiler.compile_value(&json!({"minimum": 3})).unwrap();
        assert!(bounded.inner.types.contains_type(PrimitiveType::Number));
        let sized = compiler.compile_value(&json!({"minItems": 1})).unwrap();
        assert!(sized.inner.types.contains_type(PrimitiveType::Array));
        let union = compiler
            .compile_value(&json!({"oneOf": [{"type": "string"}, {"type": "integer"}]}))
            .unwrap();
        assert!(union.inner.types.contains_type(PrimitiveType::String));
        assert!(union.inner.types.contains_type(PrimitiveType::Integer));
    }

    #[test]
    fn explicit_array_outranks_other_candidates() {
        let compiled = Compiler::new()
            .compile_value(&json!({"type": ["array", "string"]}))
            .unwrap();
        assert_eq!(compiled.inner.types.len(), 1);
        assert!(compiled.inner.types.contains_type(PrimitiveType::Array));
    }

    #[test]
    fn non_body_sources_are_required() {
        let compiled = Compiler::new()
            .compile_value(&json!({
                "type": "object",
                "properties": {
                    "token": {"type": "string", "in": ["header"]},
                    "name": {"type": "string"}
                }
            }))
            .unwrap();
        assert_eq!(compiled.inner.required, vec!["token".to_string()]);
    }

    #[test]
    fn conditional_required_promotion() {
        let compiled = Compiler::new()
            .compile_value(&json!({
                "properties": {"employmentDetails": {"type": "object"}},
                "if": {"required": ["employmentDetails"]},
                "then": {
                    "properties": {
                        "employmentDetails": {"required": ["salary"]}
                    }
                }
            }))
            .unwrap();
        assert_eq!(compiled.inner.required, vec!["employmentDetails".to_string()]);
    }

    #[test]
    fn discriminator_shape_is_checked() {
        let compiler = Compiler::new();
        let missing_name = compiler.compile_value(&json!({
            "oneOf": [{"type": "object"}],
            "discriminator": {}
        }));
        assert!(matches!(
            missing_name,
            Err(CompileError::Discriminator { .. })
        ));
        let bad_mapping = compiler.compile_value(&json!({
            "oneOf": [{"type": "object"}],
            "discriminator": {"propertyName": "kind", "mapping": {"a": 1}}
        }));
        assert!(matches!(bad_mapping, Err(CompileError::Discriminator { .. })));
    }

    #[test]
    fn self_validation_rejects_empty_title() {
        let result = Compiler::new().compile_value(&json!({
            "$vocabulary": {"https://json-schema.org/draft/2020-12/vocab/meta-data": true},
            "title": ""
        }));
        assert!(matches!(result, Err(CompileError::SelfValidation { .. })));
    }

    #[test]
    fn parallel_children_preserve_order() {
        let compiler = Compiler::with_options(
            CompilerOptions::default().with_parallel_children(true),
        );
        let compiled = compiler
            .compile_value(&json!({
                "allOf": [
                    {"title": "zero"},
                    {"title": "one"},
                    {"title": "two"},
                    {"title": "three"}
                ]
            }))
            .unwrap();
        let titles: Vec<&str> = compiled
            .inner
            .all_of
            .as_ref()
            .unwrap()
            .iter()
            .map(|child| child.inner.title.as_deref().unwrap())
            .collect();
        assert_eq!(titles, vec!["zero", "one", "two", "three"]);
    }

    #[test]
    fn malformed_keywords_are_rejected() {
        let compiler = Compiler::with_options(
            CompilerOptions::default().with_error_mode(ErrorMode::All),
        );
        assert!(matches!(
            compiler.compile_value(&json!({"type": "integre"})),
            Err(CompileError::SchemaShape { .. })
        ));
        assert!(matches!(
            compiler.compile_value(&json!({"required": "name"})),
            Err(CompileError::SchemaShape { .. })
        ));
        assert!(matches!(
            compiler.compile_value(&json!({"minLength": -1})),
            Err(CompileError::SchemaShape { .. })
        ));
    }
}
