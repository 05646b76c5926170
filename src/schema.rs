//! The compiled schema node graph.
//!
//! A `Schema` is a cheap handle to an immutable node. Nodes form a tree
//! through their structural children; the lexical parent edge is weak so
//! cyclic reference patterns (`$defs` entries referring back to their root)
//! never create ownership cycles. Anchors registered by children live in
//! the parent's local maps and are looked up by walking the parent chain.
use crate::{
    compiler::CompilerCore,
    error::ValidationErrors,
    primitive_type::PrimitiveTypesBitMap,
    validation,
};
use ahash::AHashMap;
use fancy_regex::Regex;
use parking_lot::RwLock;
use serde_json::Value;
use std::convert::TryFrom;
use std::fmt;
use std::sync::{Arc, Weak};

/// A compiled JSON Schema node. Clones share the same underlying node;
/// identity is pointer identity.
#[derive(Clone)]
pub struct Schema {
    pub(crate) inner: Arc<SchemaNode>,
}

/// A request source a property may be extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The request body (the default).
    Body,
    /// The query string.
    Query,
    /// Path parameters.
    Params,
    /// Request headers.
    Header,
}

impl Source {
    /// The wire name of the source.
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Body => "body",
            Source::Query => "query",
            Source::Params => "params",
            Source::Header => "header",
        }
    }
}

impl TryFrom<&str> for Source {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "body" => Ok(Source::Body),
            "query" => Ok(Source::Query),
            "params" => Ok(Source::Params),
            "header" => Ok(Source::Header),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The non-standard `discriminator` object selecting one `oneOf` branch.
#[derive(Debug, Clone)]
pub struct Discriminator {
    /// The instance property whose value selects the branch.
    pub property_name: String,
    /// Optional mapping from property value to a branch `$id`/`$ref`.
    pub mapping: Option<AHashMap<String, String>>,
}

/// A keyword position that takes either a bare boolean or a subschema.
#[derive(Debug, Clone)]
pub(crate) enum BoolOrSchema {
    Bool(bool),
    Schema(Schema),
}

/// A compiled `patternProperties` entry.
#[derive(Debug)]
pub(crate) struct PatternProperty {
    pub(crate) pattern: String,
    pub(crate) matcher: Arc<Regex>,
    pub(crate) schema: Schema,
}

#[derive(Debug, Default)]
pub(crate) struct SchemaNode {
    /// Set for the literal `true`/`false` schema forms; `None` for the
    /// struct form. Never combined with other attributes.
    pub(crate) boolean: Option<bool>,

    // Identity
    pub(crate) id: Option<String>,
    pub(crate) schema_uri: Option<String>,
    pub(crate) anchor: Option<String>,
    pub(crate) dynamic_anchor: Option<String>,
    pub(crate) recursive_anchor: bool,
    pub(crate) comment: Option<String>,
    pub(crate) vocabulary: Option<AHashMap<String, bool>>,

    // References
    pub(crate) reference: Option<String>,
    pub(crate) dynamic_reference: Option<String>,
    pub(crate) recursive_reference: Option<String>,

    // Structural children
    pub(crate) defs: AHashMap<String, Schema>,
    pub(crate) all_of: Option<Vec<Schema>>,
    pub(crate) any_of: Option<Vec<Schema>>,
    pub(crate) one_of: Option<Vec<Schema>>,
    pub(crate) not: Option<Schema>,
    pub(crate) if_: Option<Schema>,
    pub(crate) then_: Option<Schema>,
    pub(crate) else_: Option<Schema>,
    pub(crate) dependent_schemas: Vec<(String, Schema)>,
    pub(crate) dependent_required: Vec<(String, Vec<String>)>,

    // Array shape
    pub(crate) prefix_items: Option<Vec<Schema>>,
    pub(crate) items: Option<Schema>,
    pub(crate) unevaluated_items: Option<BoolOrSchema>,
    pub(crate) contains: Option<Schema>,
    pub(crate) max_items: Option<u64>,
    pub(crate) min_items: Option<u64>,
    pub(crate) unique_items: bool,
    pub(crate) max_contains: Option<u64>,
    pub(crate) min_contains: Option<u64>,

    // Object shape
    pub(crate) properties: Vec<(String, Schema)>,
    pub(crate) has_properties: bool,
    pub(crate) pattern_properties: Vec<PatternProperty>,
    pub(crate) additional_properties: Option<BoolOrSchema>,
    pub(crate) property_names: Option<Schema>,
    pub(crate) unevaluated_properties: Option<BoolOrSchema>,
    pub(crate) max_properties: Option<u64>,
    pub(crate) min_properties: Option<u64>,
    pub(crate) required: Vec<String>,
    pub(crate) discriminator: Option<Discriminator>,

    // Scalar constraints
    pub(crate) types: PrimitiveTypesBitMap,
    pub(crate) enum_: Option<Vec<Value>>,
    pub(crate) const_: Option<Value>,
    pub(crate) multiple_of: Option<f64>,
    pub(crate) maximum: Option<f64>,
    pub(crate) exclusive_maximum: Option<f64>,
    pub(crate) minimum: Option<f64>,
    pub(crate) exclusive_minimum: Option<f64>,
    pub(crate) max_length: Option<u64>,
    pub(crate) min_length: Option<u64>,
    pub(crate) pattern: Option<(String, Arc<Regex>)>,
    pub(crate) format: Option<String>,

    // Content
    pub(crate) content_encoding: Option<String>,
    pub(crate) content_media_type: Option<String>,
    pub(crate) content_schema: Option<Schema>,

    // Documentation / binding
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) default: Option<Value>,
    pub(crate) deprecated: bool,
    pub(crate) read_only: bool,
    pub(crate) write_only: bool,
    pub(crate) examples: Option<Vec<Value>>,
    pub(crate) sources: Vec<Source>,
    pub(crate) field: Option<String>,

    // Bookkeeping
    pub(crate) raw: Value,
    pub(crate) parent: RwLock<Weak<SchemaNode>>,
    pub(crate) anchors: RwLock<AHashMap<String, Weak<SchemaNode>>>,
    pub(crate) dynamic_anchors: RwLock<AHashMap<String, Weak<SchemaNode>>>,
    pub(crate) core: RwLock<Weak<CompilerCore>>,
}

impl Schema {
    pub(crate) fn from_node(node: SchemaNode) -> Schema {
        Schema {
            inner: Arc::new(node),
        }
    }

    /// The `$id` of the node, when declared.
    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    /// The `title` of the node, when declared.
    pub fn title(&self) -> Option<&str> {
        self.inner.title.as_deref()
    }

    /// The `description` of the node, when declared.
    pub fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    /// The `$comment` of the node, when declared.
    pub fn comment(&self) -> Option<&str> {
        self.inner.comment.as_deref()
    }

    /// The `$schema` dialect URI the document declared.
    pub fn schema_uri(&self) -> Option<&str> {
        self.inner.schema_uri.as_deref()
    }

    /// The node's `default`, after expression evaluation.
    pub fn default(&self) -> Option<&Value> {
        self.inner.default.as_ref()
    }

    /// The node's `examples`, when declared.
    pub fn examples(&self) -> Option<&[Value]> {
        self.inner.examples.as_deref()
    }

    /// Whether the node is marked `deprecated`.
    pub fn deprecated(&self) -> bool {
        self.inner.deprecated
    }

    /// Whether the node is marked `readOnly`.
    pub fn read_only(&self) -> bool {
        self.inner.read_only
    }

    /// Whether the node is marked `writeOnly`.
    pub fn write_only(&self) -> bool {
        self.inner.write_only
    }

    /// The request sources declared through the `in` keyword.
    pub fn sources(&self) -> &[Source] {
        &self.inner.sources
    }

    /// Run validation against `instance` and collect every violation.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationErrors> {
        validation::validate(self, instance)
    }

    /// Run validation against `instance` but only report whether it passed.
    /// It is useful for cases where it is important to only know the fact
    /// if the data is valid or not.
    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        validation::is_valid(self, instance)
    }

    /// Produce a coerced, default-filled copy of `instance`. The input is
    /// not mutated.
    pub fn unmarshal(&self, instance: &Value) -> Result<Value, ValidationErrors> {
        validation::coerce::unmarshal(self, instance)
    }

    /// Validate first, failing fast on error, then produce the coerced
    /// copy.
    pub fn smart_unmarshal(&self, instance: &Value) -> Result<Value, ValidationErrors> {
        self.validate(instance)?;
        self.unmarshal(instance)
    }

    /// The declared property schema for `name`, when present.
    pub(crate) fn property(&self, name: &str) -> Option<&Schema> {
        self.inner
            .properties
            .iter()
            .find(|(property, _)| property == name)
            .map(|(_, schema)| schema)
    }

    /// Walk the weak parent chain to the lexical root.
    pub(crate) fn lexical_root(&self) -> Schema {
        let mut current = Arc::clone(&self.inner);
        loop {
            let parent = current.parent.read().upgrade();
            match parent {
                Some(parent) => current = parent,
                None => return Schema { inner: current },
            }
        }
    }

    /// Ancestors of the node, nearest first, including the node itself.
    pub(crate) fn self_and_ancestors(&self) -> Vec<Schema> {
        let mut chain = vec![self.clone()];
        let mut current = Arc::clone(&self.inner);
        while let Some(parent) = {
            let parent = current.parent.read().upgrade();
            parent
        } {
            chain.push(Schema {
                inner: Arc::clone(&parent),
            });
            current = parent;
        }
        chain
    }

    pub(crate) fn upgrade_core(&self) -> Option<Arc<CompilerCore>> {
        self.inner.core.read().upgrade()
    }

    /// Structural children of the node, in keyword order. Used by the
    /// linking pass.
    pub(crate) fn children(&self) -> Vec<Schema> {
        let node = &self.inner;
        let mut children = Vec::new();
        children.extend(node.defs.values().cloned());
        for group in [&node.all_of, &node.any_of, &node.one_of, &node.prefix_items]
            .iter()
            .copied()
            .flatten()
        {
            children.extend(group.iter().cloned());
        }
        for single in [
            &node.not,
            &node.if_,
            &node.then_,
            &node.else_,
            &node.items,
            &node.contains,
            &node.property_names,
            &node.content_schema,
        ]
        .iter()
        .copied()
        .flatten()
        {
            children.push(single.clone());
        }
        children.extend(node.dependent_schemas.iter().map(|(_, schema)| schema.clone()));
        children.extend(node.properties.iter().map(|(_, schema)| schema.clone()));
        children.extend(
            node.pattern_properties
                .iter()
                .map(|property| property.schema.clone()),
        );
        for keyword in [
            &node.additional_properties,
            &node.unevaluated_properties,
            &node.unevaluated_items,
        ] {
            if let Some(BoolOrSchema::Schema(schema)) = keyword {
                children.push(schema.clone());
            }
        }
        children
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Schema");
        if let Some(boolean) = self.inner.boolean {
            debug.field("boolean", &boolean);
        }
        if let Some(id) = &self.inner.id {
            debug.field("id", id);
        }
        if !self.inner.types.is_empty() {
            debug.field("types", &self.inner.types.to_string());
        }
        if let Some(reference) = &self.inner.reference {
            debug.field("ref", reference);
        }
        debug.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Compiler;
    use serde_json::json;

    #[test]
    fn boolean_schemas() {
        let compiler = Compiler::new();
        let accept = compiler.compile_value(&json!(true)).unwrap();
        let reject = compiler.compile_value(&json!(false)).unwrap();
        assert!(accept.validate(&json!({"anything": 1})).is_ok());
        let errors = reject.validate(&json!(42)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.to_string(), "False schema does not allow '42'");
    }

    #[test]
    fn clones_share_identity() {
        let schema = Compiler::new().compile_value(&json!(true)).unwrap();
        let clone = schema.clone();
        assert!(Arc::ptr_eq(&schema.inner, &clone.inner));
    }
}
