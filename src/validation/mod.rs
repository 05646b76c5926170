//! The recursive validation engine.
//!
//! Validation walks the compiled node graph and the instance together,
//! collecting violations in traversal order. References resolve before any
//! other keyword; applicators run next; the candidate-type loop with its
//! coercion acceptance rules runs last.
pub(crate) mod coerce;
mod applicators;
mod array;
mod candidates;
pub(crate) mod helpers;
mod object;

use crate::{
    compiler::ErrorMode,
    error::{ValidationError, ValidationErrors},
    paths::InstancePath,
    resolver::{self, ResolveError},
    schema::Schema,
};
use serde_json::Value;
use std::sync::Arc;

/// Collects violations, short-circuiting after the first one under
/// `ErrorMode::First`.
pub(crate) struct ErrorSink {
    errors: Vec<ValidationError>,
    first_only: bool,
}

impl ErrorSink {
    pub(crate) fn new(first_only: bool) -> Self {
        ErrorSink {
            errors: Vec::new(),
            first_only,
        }
    }

    pub(crate) fn push(&mut self, error: ValidationError) {
        if !self.saturated() {
            self.errors.push(error);
        }
    }

    pub(crate) fn extend(&mut self, errors: Vec<ValidationError>) {
        for error in errors {
            self.push(error);
        }
    }

    pub(crate) fn saturated(&self) -> bool {
        self.first_only && !self.errors.is_empty()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

pub(crate) fn validate(schema: &Schema, instance: &Value) -> Result<(), ValidationErrors> {
    let first_only = matches!(
        schema.upgrade_core().map(|core| core.options.error_mode()),
        Some(ErrorMode::First)
    );
    let mut sink = ErrorSink::new(first_only);
    let path = InstancePath::new();
    validate_node(schema, instance, &path, &mut sink);
    if sink.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(sink.into_errors()))
    }
}

pub(crate) fn is_valid(schema: &Schema, instance: &Value) -> bool {
    let mut sink = ErrorSink::new(true);
    let path = InstancePath::new();
    validate_node(schema, instance, &path, &mut sink);
    sink.is_empty()
}

pub(crate) fn validate_node(
    schema: &Schema,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    if sink.saturated() {
        return;
    }
    let node = &*schema.inner;
    if let Some(boolean) = node.boolean {
        if !boolean {
            sink.push(ValidationError::boolean_false(path.into(), instance));
        }
        return;
    }
    if !validate_references(schema, instance, path, sink) {
        return;
    }
    if let Value::Object(map) = instance {
        object::check_required(node, map, instance, path, sink);
        object::check_additional_false(node, map, instance, path, sink);
    }
    applicators::validate_applicators(schema, instance, path, sink);
    if let Value::Array(items) = instance {
        array::check_contains(node, items, instance, path, sink);
    }
    candidates::check_candidates(schema, instance, path, sink);
}

/// Resolve every reference keyword on the node and validate the instance
/// against the targets. Returns `false` when resolution itself failed, in
/// which case validation of this node stops.
fn validate_references(
    schema: &Schema,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) -> bool {
    let node = &*schema.inner;
    let mut resolved = true;
    if let Some(reference) = &node.reference {
        match resolver::resolve_reference(schema, reference) {
            Ok(target) => validate_target(schema, &target, instance, path, sink),
            Err(error) => {
                sink.push(resolution_failure(error, instance, path));
                resolved = false;
            }
        }
    }
    if let Some(reference) = &node.dynamic_reference {
        match resolver::resolve_dynamic(schema, reference) {
            Ok(target) => validate_target(schema, &target, instance, path, sink),
            Err(error) => {
                sink.push(resolution_failure(error, instance, path));
                resolved = false;
            }
        }
    }
    if node.recursive_reference.is_some() {
        match resolver::resolve_recursive(schema) {
            Ok(target) => validate_target(schema, &target, instance, path, sink),
            Err(error) => {
                sink.push(resolution_failure(error, instance, path));
                resolved = false;
            }
        }
    }
    resolved
}

/// A reference target that is the node itself adds nothing; skipping it
/// also breaks the trivial `{"$ref": "#"}` cycle.
fn validate_target(
    schema: &Schema,
    target: &Schema,
    instance: &Value,
    path: &InstancePath,
    sink: &mut ErrorSink,
) {
    if Arc::ptr_eq(&schema.inner, &target.inner) {
        return;
    }
    validate_node(target, instance, path, sink);
}

fn resolution_failure(
    error: ResolveError,
    instance: &Value,
    path: &InstancePath,
) -> ValidationError {
    match error {
        ResolveError::Unresolvable(reference) => {
            ValidationError::ref_resolution(path.into(), instance, reference)
        }
        ResolveError::Remote { url, message } => {
            ValidationError::remote_fetch(path.into(), instance, url, message)
        }
        ResolveError::Compile(error) => {
            ValidationError::schema(path.into(), instance, error.to_string())
        }
    }
}
