//! Schema compilation.
//! The main idea is to compile the input JSON Schema into an immutable
//! graph of `Schema` nodes that holds everything needed to validate and
//! coerce instances at runtime.
pub(crate) mod context;
mod node;
pub(crate) mod options;

use crate::{
    canonical::{self, CacheKey},
    error::CompileError,
    parsing,
    schema::Schema,
};
use ahash::AHashMap;
use context::CompilationContext;
use once_cell::sync::Lazy;
pub use options::{CompilerOptions, Draft, ErrorMode};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub(crate) const DEFAULT_ROOT_URL: &str = "json-schema:///";

lazy_static::lazy_static! {
    pub(crate) static ref DEFAULT_SCOPE: Url =
        Url::parse(DEFAULT_ROOT_URL).expect("Is a valid URL");
}

/// The shared state of one compiler: registered `$id`s and the compile
/// cache keyed by the canonical hash of the input. Compiled nodes keep a
/// weak edge back to this so reference resolution can consult the
/// registry at validation time.
#[derive(Debug, Default)]
pub(crate) struct CompilerCore {
    pub(crate) registry: RwLock<AHashMap<String, Schema>>,
    cache: RwLock<AHashMap<CacheKey, Schema>>,
    pub(crate) options: CompilerOptions,
}

/// Compiles schema documents into validation graphs, deduplicating work
/// through a canonical-hash cache. Cheap to share between threads.
#[derive(Debug, Clone)]
pub struct Compiler {
    pub(crate) core: Arc<CompilerCore>,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

impl Compiler {
    /// A compiler with default options.
    #[must_use]
    pub fn new() -> Compiler {
        Compiler::with_options(CompilerOptions::default())
    }

    /// A compiler with the given options.
    #[must_use]
    pub fn with_options(options: CompilerOptions) -> Compiler {
        Compiler {
            core: Arc::new(CompilerCore {
                registry: RwLock::new(AHashMap::new()),
                cache: RwLock::new(AHashMap::new()),
                options,
            }),
        }
    }

    pub(crate) fn from_core(core: Arc<CompilerCore>) -> Compiler {
        Compiler { core }
    }

    /// The options this compiler was built with.
    pub fn options(&self) -> &CompilerOptions {
        &self.core.options
    }

    /// Compile raw schema bytes into a validation graph.
    pub fn compile(&self, schema: &[u8]) -> Result<Schema, CompileError> {
        let value = parsing::parse_slice(schema)?;
        self.compile_value(&value)
    }

    /// Compile an already parsed schema document. Two documents differing
    /// only in mapping key order share one cache entry.
    pub fn compile_value(&self, value: &Value) -> Result<Schema, CompileError> {
        let key = canonical::digest(value);
        if let Some(schema) = self.core.cache.read().get(&key) {
            return Ok(schema.clone());
        }
        let context = CompilationContext::new(&self.core);
        let schema = node::compile_node(value, &context)?;
        link(&schema, None, &self.core);
        self.core
            .cache
            .write()
            .entry(key)
            .or_insert_with(|| schema.clone());
        Ok(schema)
    }

    /// The schema registered under `id`, when there is one.
    pub fn registered(&self, id: &str) -> Option<Schema> {
        self.core.registry.read().get(id).cloned()
    }

    /// Register `schema` under `id`, replacing an earlier registration.
    pub fn register(&self, id: impl Into<String>, schema: Schema) {
        self.core.registry.write().insert(id.into(), schema);
    }
}

/// The linking pass: set weak parent edges, register anchors into the
/// parent's local maps and `$id`s into the compiler registry. Anchors are
/// last-write-wins when the same name is declared twice in one scope.
pub(crate) fn link(schema: &Schema, parent: Option<&Schema>, core: &Arc<CompilerCore>) {
    if let Some(parent) = parent {
        *schema.inner.parent.write() = Arc::downgrade(&parent.inner);
        if let Some(anchor) = &schema.inner.anchor {
            parent
                .inner
                .anchors
                .write()
                .insert(anchor.clone(), Arc::downgrade(&schema.inner));
        }
        if let Some(anchor) = &schema.inner.dynamic_anchor {
            parent
                .inner
                .dynamic_anchors
                .write()
                .insert(anchor.clone(), Arc::downgrade(&schema.inner));
        }
    }
    if let Some(id) = &schema.inner.id {
        core.registry.write().insert(id.clone(), schema.clone());
    }
    for child in schema.children() {
        link(&child, Some(schema), core);
    }
}

static DEFAULT_COMPILER: Lazy<Compiler> = Lazy::new(Compiler::new);

/// The process-wide compiler behind the crate-level free functions.
pub(crate) fn default_compiler() -> &'static Compiler {
    &DEFAULT_COMPILER
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_keyword() {
        // When only one keyword is specified
        let schema = json!({"type": "string"});
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        assert!(compiled.validate(&json!("AB")).is_ok());
        assert!(compiled.validate(&json!(1)).is_err());
    }

    #[test]
    fn wrong_schema_type() {
        let schema = json!([1]);
        assert!(Compiler::new().compile_value(&schema).is_err());
    }

    #[test]
    fn cache_hits_are_identical() {
        let compiler = Compiler::new();
        let first = compiler
            .compile_value(&json!({"b": {"type": "integer"}, "a": true, "type": "object"}))
            .unwrap();
        let second = compiler
            .compile_value(&json!({"a": true, "type": "object", "b": {"type": "integer"}}))
            .unwrap();
        assert!(Arc::ptr_eq(&first.inner, &second.inner));
    }

    #[test]
    fn ids_are_registered() {
        let compiler = Compiler::new();
        compiler
            .compile_value(&json!({
                "$id": "https://example.com/person.json",
                "type": "object"
            }))
            .unwrap();
        assert!(compiler.registered("https://example.com/person.json").is_some());
    }

    #[test]
    fn relative_ids_resolve_against_the_scope() {
        let compiler = Compiler::new();
        compiler
            .compile_value(&json!({
                "$id": "https://example.com/root.json",
                "$defs": {
                    "leaf": {"$id": "leaf.json", "type": "integer"}
                }
            }))
            .unwrap();
        assert!(compiler.registered("https://example.com/leaf.json").is_some());
    }

    #[test]
    fn multiple_errors() {
        let schema = json!({"minProperties": 2, "propertyNames": {"minLength": 3}});
        let value = json!({"a": 3});
        let compiled = Compiler::new().compile_value(&schema).unwrap();
        let errors = compiled.validate(&value).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
