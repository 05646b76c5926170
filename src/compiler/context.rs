//! Compilation context: the current `$id` scope and keyword path.
use super::{CompilerCore, DEFAULT_SCOPE};
use crate::error::CompileError;
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

/// Holds the resolution scope and the keyword path of the node currently
/// being compiled. All URLs built from the context have the scope in them,
/// which keeps track of `$id` sub-folders during compilation.
#[derive(Debug, Clone)]
pub(crate) struct CompilationContext<'a> {
    pub(crate) core: &'a Arc<CompilerCore>,
    pub(crate) scope: Url,
    path: Vec<String>,
}

impl<'a> CompilationContext<'a> {
    pub(crate) fn new(core: &'a Arc<CompilerCore>) -> Self {
        CompilationContext {
            core,
            scope: DEFAULT_SCOPE.clone(),
            path: Vec::with_capacity(4),
        }
    }

    /// Enter `object`, resolving a declared `$id` against the current
    /// scope. The second result is the absolute form of the `$id`, used
    /// for registration.
    pub(crate) fn push_scope(
        &self,
        object: &Map<String, Value>,
    ) -> Result<(Self, Option<String>), CompileError> {
        match object.get("$id") {
            Some(Value::String(id)) => {
                let scope = Url::options()
                    .base_url(Some(&self.scope))
                    .parse(id)
                    .map_err(|_| self.shape_error("$id"))?;
                let resolved = scope.to_string();
                Ok((
                    CompilationContext {
                        core: self.core,
                        scope,
                        path: self.path.clone(),
                    },
                    Some(resolved),
                ))
            }
            Some(_) => Err(self.shape_error("$id")),
            None => Ok((self.clone(), None)),
        }
    }

    /// A child context one keyword deeper.
    pub(crate) fn with_keyword(&self, keyword: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(keyword.into());
        CompilationContext {
            core: self.core,
            scope: self.scope.clone(),
            path,
        }
    }

    pub(crate) fn path_string(&self) -> String {
        self.path.join("/")
    }

    pub(crate) fn shape_error(&self, keyword: impl Into<String>) -> CompileError {
        CompileError::SchemaShape {
            path: self.path_string(),
            keyword: keyword.into(),
        }
    }
}
