//! Dotted-path helpers over raw JSON bytes.
//!
//! Paths parse through the same chunk machinery the validator uses for
//! its error pointers, so `"user.tags.0"` addresses the array element and
//! numeric object keys alike.
use crate::error::ParseError;
use crate::paths::{JSONPointer, PathChunk};
use crate::{codec, error::Error, parsing};
use serde_json::{Map, Value};

/// Fetch the leaf value at `path` (e.g. `"user.address.city"`). Numeric
/// segments index into arrays.
pub fn get(data: &[u8], path: &str) -> Result<Option<Value>, Error> {
    let value = parsing::parse_slice(data)?;
    Ok(JSONPointer::from_dotted(path).lookup(&value).cloned())
}

/// Set the leaf at `path` to `new_value`, creating intermediate objects as
/// needed, and re-serialise through the codec indirection.
pub fn set(data: &[u8], path: &str, new_value: Value) -> Result<Vec<u8>, Error> {
    let mut value = parsing::parse_slice(data)?;
    let pointer = JSONPointer::from_dotted(path);
    set_in(&mut value, pointer.chunks(), new_value)?;
    Ok(codec::encode_value(&value)?)
}

fn set_in(value: &mut Value, chunks: &[PathChunk], new_value: Value) -> Result<(), Error> {
    let mut pending = Some(new_value);
    let mut current = value;
    for (position, chunk) in chunks.iter().enumerate() {
        let last = position + 1 == chunks.len();
        // Scalars on the way are replaced by fresh objects
        if !current.is_object() && !current.is_array() {
            *current = Value::Object(Map::new());
        }
        match current {
            Value::Object(map) => {
                // An index chunk addresses the numeric object key
                let key = match chunk {
                    PathChunk::Property(name) => name.clone(),
                    PathChunk::Index(index) => index.to_string(),
                };
                if last {
                    map.insert(key, pending.take().expect("Set exactly once"));
                    return Ok(());
                }
                current = map
                    .entry(key)
                    .or_insert_with(|| Value::Object(Map::new()));
            }
            Value::Array(items) => {
                let index = match chunk {
                    PathChunk::Index(index) => *index,
                    PathChunk::Property(name) => {
                        return Err(Error::Parse(ParseError::new(
                            0,
                            format!("'{}' is not an array index", name),
                        )))
                    }
                };
                let length = items.len();
                let slot = items.get_mut(index).ok_or_else(|| {
                    Error::Parse(ParseError::new(
                        0,
                        format!("index {} out of bounds for length {}", index, length),
                    ))
                })?;
                if last {
                    *slot = pending.take().expect("Set exactly once");
                    return Ok(());
                }
                current = slot;
            }
            _ => unreachable!("containers ensured above"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_walks_objects_and_arrays() {
        let data = br#"{"user": {"tags": ["a", "b"], "name": "x"}}"#;
        assert_eq!(get(data, "user.name").unwrap(), Some(json!("x")));
        assert_eq!(get(data, "user.tags.1").unwrap(), Some(json!("b")));
        assert_eq!(get(data, "user.missing").unwrap(), None);
    }

    #[test]
    fn set_replaces_and_creates() {
        let data = br#"{"user": {"name": "x"}}"#;
        let updated = set(data, "user.name", json!("y")).unwrap();
        assert_eq!(get(&updated, "user.name").unwrap(), Some(json!("y")));
        let updated = set(data, "user.address.city", json!("Oslo")).unwrap();
        assert_eq!(get(&updated, "user.address.city").unwrap(), Some(json!("Oslo")));
    }

    #[test]
    fn set_indexes_arrays() {
        let data = br#"{"tags": ["a", "b"]}"#;
        let updated = set(data, "tags.0", json!("z")).unwrap();
        assert_eq!(get(&updated, "tags.0").unwrap(), Some(json!("z")));
        assert!(set(data, "tags.9", json!("z")).is_err());
    }

    #[test]
    fn numeric_segments_reach_numeric_object_keys() {
        let data = br#"{"by_id": {"7": {"name": "x"}}}"#;
        assert_eq!(get(data, "by_id.7.name").unwrap(), Some(json!("x")));
        let updated = set(data, "by_id.7.name", json!("y")).unwrap();
        assert_eq!(get(&updated, "by_id.7.name").unwrap(), Some(json!("y")));
    }
}
