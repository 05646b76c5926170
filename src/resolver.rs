//! Reference resolution. Implements the logic required by `$ref`,
//! `$dynamicRef` and `$recursiveRef`, including loading documents from
//! remote locations over HTTP(S).
//!
//! Same-document references walk the lexical parent chain of the compiled
//! graph; remote references go through a process-wide cache so a given URI
//! is fetched once per process (best effort under contention).
use crate::{
    compiler::{Compiler, CompilerOptions},
    error::CompileError,
    schema::Schema,
};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::borrow::Cow;
use std::thread::ThreadId;
use std::time::Duration;

/// Why a reference could not be resolved.
#[derive(Debug)]
pub(crate) enum ResolveError {
    /// No target exists for the reference.
    Unresolvable(String),
    /// The remote document could not be fetched.
    Remote { url: String, message: String },
    /// The remote document fetched fine but is not a valid schema.
    Compile(CompileError),
}

#[derive(Debug, Clone)]
enum RemoteEntry {
    /// A fetch is in flight on the given thread. Observing our own
    /// placeholder means the fetch recursed into itself.
    Pending(ThreadId),
    Ready(Schema),
}

static REMOTE_CACHE: Lazy<RwLock<AHashMap<String, RemoteEntry>>> =
    Lazy::new(|| RwLock::new(AHashMap::new()));

/// Drop every cached remote schema. For tests.
pub fn reset_remote_cache() {
    REMOTE_CACHE.write().clear();
}

/// Resolve a `$ref` relative to `schema`.
pub(crate) fn resolve_reference(schema: &Schema, reference: &str) -> Result<Schema, ResolveError> {
    if reference == "#" {
        return Ok(schema.lexical_root());
    }
    if let Some(fragment) = reference.strip_prefix('#') {
        if fragment.starts_with('/') {
            resolve_pointer(schema, fragment)
                .ok_or_else(|| ResolveError::Unresolvable(reference.to_string()))
        } else {
            resolve_anchor(schema, fragment)
                .ok_or_else(|| ResolveError::Unresolvable(reference.to_string()))
        }
    } else {
        resolve_remote(schema, reference)
    }
}

/// Resolve a `$dynamicRef`. The dynamic anchor nearest in the enclosing
/// compilation wins; non-fragment references fall back to plain `$ref`
/// semantics.
pub(crate) fn resolve_dynamic(schema: &Schema, reference: &str) -> Result<Schema, ResolveError> {
    let name = match reference.strip_prefix('#') {
        Some(name) if !name.is_empty() && !name.starts_with('/') => name,
        _ => return resolve_reference(schema, reference),
    };
    for ancestor in schema.self_and_ancestors() {
        if ancestor.inner.dynamic_anchor.as_deref() == Some(name) {
            return Ok(ancestor);
        }
        let upgraded = ancestor
            .inner
            .dynamic_anchors
            .read()
            .get(name)
            .and_then(std::sync::Weak::upgrade);
        if let Some(node) = upgraded {
            return Ok(Schema { inner: node });
        }
    }
    Err(ResolveError::Unresolvable(reference.to_string()))
}

/// Resolve `$recursiveRef: "#"`: the nearest strict ancestor that set
/// `$recursiveAnchor: true`.
pub(crate) fn resolve_recursive(schema: &Schema) -> Result<Schema, ResolveError> {
    for ancestor in schema.self_and_ancestors().into_iter().skip(1) {
        if ancestor.inner.recursive_anchor {
            return Ok(ancestor);
        }
    }
    Err(ResolveError::Unresolvable("#".to_string()))
}

fn resolve_anchor(schema: &Schema, name: &str) -> Option<Schema> {
    for ancestor in schema.self_and_ancestors() {
        if ancestor.inner.anchor.as_deref() == Some(name) {
            return Some(ancestor);
        }
        let upgraded = ancestor
            .inner
            .anchors
            .read()
            .get(name)
            .and_then(std::sync::Weak::upgrade);
        if let Some(node) = upgraded {
            return Some(Schema { inner: node });
        }
    }
    None
}

/// Searching twice is better than unconditionally allocating a String twice
trait MaybeReplaceExt<'a> {
    fn maybe_replace(self, needle: &str, replacement: &str) -> Cow<'a, str>;
}

impl<'a> MaybeReplaceExt<'a> for &'a str {
    fn maybe_replace(self, needle: &str, replacement: &str) -> Cow<'a, str> {
        if memchr::memmem::find(self.as_bytes(), needle.as_bytes()).is_some() {
            self.replace(needle, replacement).into()
        } else {
            self.into()
        }
    }
}

impl<'a> MaybeReplaceExt<'a> for Cow<'a, str> {
    fn maybe_replace(self, needle: &str, replacement: &str) -> Cow<'a, str> {
        if memchr::memmem::find(self.as_bytes(), needle.as_bytes()).is_some() {
            self.replace(needle, replacement).into()
        } else {
            self
        }
    }
}

/// Follow a JSON Pointer fragment through the compiled graph, starting at
/// the lexical root. Walking compiled nodes (rather than re-compiling the
/// raw subtree) preserves node identity, parent edges and anchors.
fn resolve_pointer(schema: &Schema, fragment: &str) -> Option<Schema> {
    let decoded = percent_decode_str(fragment).decode_utf8().ok()?;
    let tokens: Vec<String> = decoded
        .split('/')
        .skip(1)
        .map(|token| {
            token
                .maybe_replace("~1", "/")
                .maybe_replace("~0", "~")
                .into_owned()
        })
        .collect();
    let mut current = schema.lexical_root();
    let mut index = 0;
    while index < tokens.len() {
        let token = tokens[index].as_str();
        let named = |index: usize| tokens.get(index + 1).map(String::as_str);
        let next = match token {
            "$defs" | "definitions" => {
                let name = named(index)?;
                index += 1;
                current.inner.defs.get(name).cloned()
            }
            "properties" => {
                let name = named(index)?;
                index += 1;
                current.property(name).cloned()
            }
            "patternProperties" => {
                let name = named(index)?;
                index += 1;
                current
                    .inner
                    .pattern_properties
                    .iter()
                    .find(|property| property.pattern == name)
                    .map(|property| property.schema.clone())
            }
            "dependentSchemas" => {
                let name = named(index)?;
                index += 1;
                current
                    .inner
                    .dependent_schemas
                    .iter()
                    .find(|(dependent, _)| dependent == name)
                    .map(|(_, schema)| schema.clone())
            }
            "allOf" | "anyOf" | "oneOf" | "prefixItems" => {
                let position: usize = named(index)?.parse().ok()?;
                index += 1;
                let group = match token {
                    "allOf" => &current.inner.all_of,
                    "anyOf" => &current.inner.any_of,
                    "oneOf" => &current.inner.one_of,
                    _ => &current.inner.prefix_items,
                };
                group.as_ref().and_then(|children| children.get(position).cloned())
            }
            "items" => current.inner.items.clone(),
            "not" => current.inner.not.clone(),
            "if" => current.inner.if_.clone(),
            "then" => current.inner.then_.clone(),
            "else" => current.inner.else_.clone(),
            "contains" => current.inner.contains.clone(),
            "propertyNames" => current.inner.property_names.clone(),
            "contentSchema" => current.inner.content_schema.clone(),
            "additionalProperties" => match &current.inner.additional_properties {
                Some(crate::schema::BoolOrSchema::Schema(schema)) => Some(schema.clone()),
                _ => None,
            },
            _ => None,
        };
        current = next?;
        index += 1;
    }
    Some(current)
}

/// Depth-first search for a named anchor inside a (remote) compiled tree.
fn find_anchor(schema: &Schema, name: &str) -> Option<Schema> {
    if schema.inner.anchor.as_deref() == Some(name)
        || schema.inner.dynamic_anchor.as_deref() == Some(name)
    {
        return Some(schema.clone());
    }
    for child in schema.children() {
        if let Some(found) = find_anchor(&child, name) {
            return Some(found);
        }
    }
    None
}

fn resolve_remote(schema: &Schema, reference: &str) -> Result<Schema, ResolveError> {
    let (base, fragment) = match reference.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (reference, None),
    };
    let document = remote_document(schema, base, reference)?;
    match fragment {
        None | Some("") => Ok(document),
        Some(fragment) if fragment.starts_with('/') => resolve_pointer(&document, fragment)
            .ok_or_else(|| ResolveError::Unresolvable(reference.to_string())),
        Some(fragment) => find_anchor(&document, fragment)
            .ok_or_else(|| ResolveError::Unresolvable(reference.to_string())),
    }
}

fn remote_document(schema: &Schema, base: &str, reference: &str) -> Result<Schema, ResolveError> {
    // Fast path: already cached, or registered with the owning compiler
    match REMOTE_CACHE.read().get(base) {
        Some(RemoteEntry::Ready(document)) => return Ok(document.clone()),
        Some(RemoteEntry::Pending(thread)) if *thread == std::thread::current().id() => {
            return Err(ResolveError::Unresolvable(format!(
                "circular remote reference: {}",
                reference
            )));
        }
        // A fetch is in flight elsewhere; duplicate fetches are permitted
        // and idempotent, so fall through instead of blocking.
        _ => {}
    }
    let core = schema.upgrade_core();
    if let Some(core) = &core {
        if let Some(registered) = core.registry.read().get(base) {
            return Ok(registered.clone());
        }
    }
    let options = core
        .as_ref()
        .map(|core| core.options.clone())
        .unwrap_or_default();
    REMOTE_CACHE.write().entry(base.to_string()).or_insert_with(|| {
        RemoteEntry::Pending(std::thread::current().id())
    });
    let outcome = fetch_and_compile(base, &options, core.map(Compiler::from_core));
    let mut cache = REMOTE_CACHE.write();
    match outcome {
        Ok(document) => {
            cache.insert(base.to_string(), RemoteEntry::Ready(document.clone()));
            Ok(document)
        }
        Err(error) => {
            if matches!(cache.get(base), Some(RemoteEntry::Pending(_))) {
                cache.remove(base);
            }
            Err(error)
        }
    }
}

fn fetch_and_compile(
    url: &str,
    options: &CompilerOptions,
    compiler: Option<Compiler>,
) -> Result<Schema, ResolveError> {
    let body = fetch_document(url, options.remote_timeout()).map_err(|message| {
        ResolveError::Remote {
            url: url.to_string(),
            message,
        }
    })?;
    let compiler = compiler.unwrap_or_else(|| Compiler::with_options(options.clone()));
    compiler
        .compile_value(&body)
        .map_err(ResolveError::Compile)
}

#[cfg(feature = "resolve-http")]
fn fetch_document(url: &str, timeout: Duration) -> Result<Value, String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|error| error.to_string())?;
    let response = client
        .get(url)
        .send()
        .map_err(|error| error.to_string())?;
    let body = response.bytes().map_err(|error| error.to_string())?;
    crate::parsing::parse_slice(&body).map_err(|error| error.to_string())
}

#[cfg(not(feature = "resolve-http"))]
fn fetch_document(_url: &str, _timeout: Duration) -> Result<Value, String> {
    Err("the `resolve-http` feature is required to fetch remote schemas".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Compiler;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn local_anchor_on_the_parent_chain() {
        let compiled = Compiler::new()
            .compile_value(&json!({
                "$defs": {
                    "positive": {"$anchor": "positive", "type": "integer", "minimum": 1}
                },
                "properties": {
                    "count": {"$ref": "#positive"}
                }
            }))
            .unwrap();
        let reference = compiled.property("count").unwrap();
        let resolved = resolve_reference(reference, "#positive").unwrap();
        assert!(Arc::ptr_eq(
            &resolved.inner,
            &compiled.inner.defs.get("positive").unwrap().inner
        ));
    }

    #[test]
    fn pointer_fragments_walk_the_compiled_graph() {
        let compiled = Compiler::new()
            .compile_value(&json!({
                "$defs": {"name": {"type": "string", "minLength": 1}},
                "properties": {"first": {"$ref": "#/$defs/name"}}
            }))
            .unwrap();
        let reference = compiled.property("first").unwrap();
        let resolved = resolve_reference(reference, "#/$defs/name").unwrap();
        assert!(Arc::ptr_eq(&resolved.inner, &compiled.inner.defs.get("name").unwrap().inner));
    }

    #[test]
    fn dynamic_anchor_nearest_wins() {
        let compiled = Compiler::new()
            .compile_value(&json!({
                "$dynamicAnchor": "node",
                "$defs": {
                    "inner": {
                        "$dynamicAnchor": "node",
                        "properties": {
                            "next": {"$dynamicRef": "#node"}
                        }
                    }
                }
            }))
            .unwrap();
        let leaf = compiled.inner.defs.get("inner").unwrap().property("next").unwrap();
        let resolved = resolve_dynamic(leaf, "#node").unwrap();
        // The `inner` declaration is nearer than the root one
        assert!(Arc::ptr_eq(
            &resolved.inner,
            &compiled.inner.defs.get("inner").unwrap().inner
        ));
    }

    #[test]
    fn recursive_anchor_walks_strictly_upward() {
        let compiled = Compiler::new()
            .compile_value(&json!({
                "$recursiveAnchor": true,
                "properties": {
                    "child": {"$recursiveRef": "#"}
                }
            }))
            .unwrap();
        let leaf = compiled.property("child").unwrap();
        let resolved = resolve_recursive(leaf).unwrap();
        assert!(Arc::ptr_eq(&resolved.inner, &compiled.inner));
    }

    #[test]
    fn unresolvable_reference() {
        let compiled = Compiler::new()
            .compile_value(&json!({"properties": {"a": {"$ref": "#missing"}}}))
            .unwrap();
        let reference = compiled.property("a").unwrap();
        assert!(matches!(
            resolve_reference(reference, "#missing"),
            Err(ResolveError::Unresolvable(_))
        ));
    }

    #[test]
    fn registered_ids_resolve_without_fetching() {
        let compiler = Compiler::new();
        let person = compiler
            .compile_value(&json!({
                "$id": "https://example.com/person.json",
                "type": "object",
                "properties": {"name": {"type": "string"}}
            }))
            .unwrap();
        let referencing = compiler
            .compile_value(&json!({"$ref": "https://example.com/person.json"}))
            .unwrap();
        let resolved =
            resolve_reference(&referencing, "https://example.com/person.json").unwrap();
        assert!(Arc::ptr_eq(&resolved.inner, &person.inner));
    }
}
