//! Instance locations.
//!
//! Two addressing schemes meet here: validation errors carry RFC 6901
//! JSON Pointers into the instance, while the binding layer and the
//! `get`/`set` helpers address instances through dotted source paths
//! (`"user.address.city"`). Both render and walk the same chunk
//! representation, so a path parsed from one scheme can be looked up or
//! printed in the other.
use serde_json::Value;
use std::{cell::RefCell, fmt};

/// One step into an instance: an object property or an array index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum PathChunk {
    Property(String),
    Index(usize),
}

/// A JSON Pointer into a validated instance.
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct JSONPointer(Vec<PathChunk>);

impl JSONPointer {
    /// The pointer as owned strings, indexes rendered in decimal.
    pub fn into_vec(self) -> Vec<String> {
        self.0
            .into_iter()
            .map(|chunk| match chunk {
                PathChunk::Property(name) => name,
                PathChunk::Index(index) => index.to_string(),
            })
            .collect()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a dotted source path. Numeric segments address array
    /// positions; everything else is a property name.
    pub(crate) fn from_dotted(path: &str) -> JSONPointer {
        JSONPointer(
            path.split('.')
                .map(|segment| match segment.parse::<usize>() {
                    Ok(index) => PathChunk::Index(index),
                    Err(_) => PathChunk::Property(segment.to_string()),
                })
                .collect(),
        )
    }

    /// Walk `value` along the pointer. An index chunk falls back to the
    /// equivalent numeric object key, so dotted paths can reach both
    /// `tags.0` and `{"0": …}` shapes.
    pub(crate) fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for chunk in &self.0 {
            current = match (chunk, current) {
                (PathChunk::Property(name), Value::Object(map)) => map.get(name)?,
                (PathChunk::Index(index), Value::Array(items)) => items.get(*index)?,
                (PathChunk::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub(crate) fn chunks(&self) -> &[PathChunk] {
        &self.0
    }
}

impl fmt::Display for JSONPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        for chunk in &self.0 {
            f.write_char('/')?;
            match chunk {
                PathChunk::Property(name) => {
                    // RFC 6901: `~` and `/` inside a token travel escaped
                    for character in name.chars() {
                        match character {
                            '~' => f.write_str("~0")?,
                            '/' => f.write_str("~1")?,
                            _ => f.write_char(character)?,
                        }
                    }
                }
                PathChunk::Index(index) => write!(f, "{}", index)?,
            }
        }
        Ok(())
    }
}

impl From<String> for PathChunk {
    #[inline]
    fn from(value: String) -> Self {
        PathChunk::Property(value)
    }
}
impl From<&str> for PathChunk {
    #[inline]
    fn from(value: &str) -> Self {
        PathChunk::Property(value.to_string())
    }
}
impl From<usize> for PathChunk {
    #[inline]
    fn from(value: usize) -> Self {
        PathChunk::Index(value)
    }
}

/// The engine's current position inside the instance. Descending returns
/// a guard that pops the chunk again when the scope ends, so traversal
/// code cannot leave the path unbalanced on any exit.
#[derive(Debug, Default)]
pub(crate) struct InstancePath {
    chunks: RefCell<Vec<PathChunk>>,
}

impl InstancePath {
    pub(crate) fn new() -> Self {
        InstancePath {
            chunks: RefCell::new(Vec::with_capacity(8)),
        }
    }

    #[inline]
    pub(crate) fn descend(&self, chunk: impl Into<PathChunk>) -> PathGuard<'_> {
        self.chunks.borrow_mut().push(chunk.into());
        PathGuard { path: self }
    }
}

#[derive(Debug)]
pub(crate) struct PathGuard<'a> {
    path: &'a InstancePath,
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.path.chunks.borrow_mut().pop();
    }
}

impl From<&InstancePath> for JSONPointer {
    #[inline]
    fn from(path: &InstancePath) -> Self {
        JSONPointer(path.chunks.borrow().clone())
    }
}

impl From<&[&str]> for JSONPointer {
    #[inline]
    fn from(path: &[&str]) -> Self {
        JSONPointer(
            path.iter()
                .map(|item| PathChunk::Property(item.to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn guards_pop_on_scope_exit() {
        let path = InstancePath::new();
        {
            let _outer = path.descend("employmentDetails");
            {
                let _inner = path.descend("salary");
                assert_eq!(
                    JSONPointer::from(&path).to_string(),
                    "/employmentDetails/salary"
                );
            }
            let _index = path.descend(3_usize);
            assert_eq!(JSONPointer::from(&path).to_string(), "/employmentDetails/3");
        }
        assert_eq!(JSONPointer::from(&path).to_string(), "");
    }

    #[test]
    fn tokens_are_escaped() {
        let path = InstancePath::new();
        let _guard = path.descend("a/b~c");
        assert_eq!(JSONPointer::from(&path).to_string(), "/a~1b~0c");
    }

    #[test]
    fn dotted_paths_parse_and_walk() {
        let value = json!({"user": {"tags": ["a", "b"], "0": "zero"}});
        assert_eq!(
            JSONPointer::from_dotted("user.tags.1").lookup(&value),
            Some(&json!("b"))
        );
        assert_eq!(
            JSONPointer::from_dotted("user.0").lookup(&value),
            Some(&json!("zero"))
        );
        assert_eq!(JSONPointer::from_dotted("user.missing").lookup(&value), None);
    }

    #[test]
    fn empty_pointer_is_root() {
        assert_eq!(JSONPointer::default().to_string(), "");
    }
}
