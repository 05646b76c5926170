//! The process-wide vocabulary validator registry.
//!
//! A schema opts into vocabularies through `$vocabulary`; every enabled
//! vocabulary with a registered validator is checked during compilation.
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A predicate over the raw schema mapping, returning why the schema is
/// rejected when it is.
pub type VocabularyValidator =
    Arc<dyn Fn(&Map<String, Value>) -> Result<(), String> + Send + Sync>;

static REGISTRY: Lazy<RwLock<AHashMap<String, VocabularyValidator>>> =
    Lazy::new(|| RwLock::new(AHashMap::new()));

/// Register a validator for the vocabulary identified by `uri`.
pub fn register_vocabulary(
    uri: impl Into<String>,
    check: impl Fn(&Map<String, Value>) -> Result<(), String> + Send + Sync + 'static,
) {
    REGISTRY.write().insert(uri.into(), Arc::new(check));
}

/// Remove all registered vocabulary validators.
pub fn reset_vocabularies() {
    REGISTRY.write().clear();
}

pub(crate) fn lookup(uri: &str) -> Option<VocabularyValidator> {
    REGISTRY.read().get(uri).map(Arc::clone)
}
