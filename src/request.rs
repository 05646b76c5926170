//! Binding validated instances out of HTTP-style requests.
//!
//! Framework adapters implement [`RequestSource`]; the binding algorithm
//! assembles a working instance from the body plus any per-property
//! sources the schema declares through the non-standard `in`/`field`
//! keywords, then runs `smart_unmarshal` and decodes the merged output
//! into the caller's destination type through the codec indirection.
use crate::{
    codec,
    compiler::default_compiler,
    error::BindError,
    parsing,
    primitive_type::PrimitiveType,
    schema::{Schema, Source},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};

/// The abstract request contract: body bytes plus named lookups for
/// query/path/header values.
pub trait RequestSource {
    /// The raw request body, if any.
    fn body(&self) -> Option<Vec<u8>>;
    /// A query-string parameter.
    fn query(&self, name: &str) -> Option<String>;
    /// A path parameter.
    fn param(&self, name: &str) -> Option<String>;
    /// A header value.
    fn header(&self, name: &str) -> Option<String>;
}

/// Compile `schema` bytes and bind the request into `destination` type
/// `T`.
pub fn unmarshal_and_validate_request<S, T>(source: &S, schema: &[u8]) -> Result<T, BindError>
where
    S: RequestSource,
    T: DeserializeOwned,
{
    let compiled = default_compiler().compile(schema)?;
    bind_request(source, &compiled)
}

/// Bind a request against an already compiled schema.
pub fn bind_request<S, T>(source: &S, schema: &Schema) -> Result<T, BindError>
where
    S: RequestSource,
    T: DeserializeOwned,
{
    // The body is the primary instance; empty or unparseable bodies start
    // from an empty mapping
    let body = source.body().unwrap_or_default();
    let mut instance = match parsing::parse_slice(&body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    apply_sources(schema, &mut instance, source)?;
    let merged = schema.smart_unmarshal(&Value::Object(instance))?;
    let bytes = codec::encode_value(&merged)?;
    let value = codec::decode_value(&bytes)?;
    serde_json::from_value(value).map_err(|error| BindError::Codec(error.into()))
}

enum Extracted {
    FromBody,
    Text(String),
}

fn apply_sources<S: RequestSource>(
    schema: &Schema,
    map: &mut Map<String, Value>,
    source: &S,
) -> Result<(), BindError> {
    for (name, property) in &schema.inner.properties {
        let node = &*property.inner;
        if node.sources.iter().any(|candidate| *candidate != Source::Body) {
            let lookup = node
                .field
                .as_deref()
                .map(|field| field.rsplit('.').next().unwrap_or(field))
                .unwrap_or(name);
            let mut extracted = None;
            for candidate in &node.sources {
                extracted = match candidate {
                    Source::Body => map.get(name).map(|_| Extracted::FromBody),
                    Source::Query => source.query(lookup).map(Extracted::Text),
                    Source::Params => source.param(lookup).map(Extracted::Text),
                    Source::Header => source
                        .header(lookup)
                        .map(|value| Extracted::Text(strip_auth_scheme(lookup, value))),
                };
                if extracted.is_some() {
                    break;
                }
            }
            match extracted {
                Some(Extracted::FromBody) => {}
                Some(Extracted::Text(text)) => {
                    map.insert(name.clone(), coerce_extracted(property, text));
                }
                None => {
                    if !map.contains_key(name) && node.default.is_none() {
                        return Err(BindError::Extraction {
                            source: node
                                .sources
                                .iter()
                                .map(|candidate| candidate.as_str())
                                .collect::<Vec<&str>>()
                                .join(","),
                            field: name.clone(),
                        });
                    }
                    // A body value or a default stands in; nothing to do
                }
            }
        } else if subtree_has_non_body_sources(property) {
            // Nested object properties recurse
            let created = !map.contains_key(name);
            {
                let entry = map
                    .entry(name.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(nested) = entry {
                    apply_sources(property, nested, source)?;
                }
            }
            let still_empty = map
                .get(name)
                .and_then(Value::as_object)
                .map_or(false, Map::is_empty);
            if created && still_empty {
                map.remove(name);
            }
        } else if let Some(Value::Object(nested)) = map.get_mut(name) {
            apply_sources(property, nested, source)?;
        }
    }
    Ok(())
}

/// `Authorization: Bearer <token>` style headers bind only the token.
fn strip_auth_scheme(name: &str, value: String) -> String {
    if name.eq_ignore_ascii_case("authorization") {
        if let Some((_, token)) = value.split_once(' ') {
            return token.trim().to_string();
        }
    }
    value
}

/// Extracted strings are coerced to the property's declared type before
/// the instance is validated.
fn coerce_extracted(property: &Schema, text: String) -> Value {
    let types = property.inner.types;
    if types.contains_type(PrimitiveType::Integer) {
        if let Ok(value) = text.parse::<i64>() {
            return Value::Number(Number::from(value));
        }
    }
    if types.contains_type(PrimitiveType::Number) {
        if let Ok(value) = text.parse::<f64>() {
            if let Some(number) = Number::from_f64(value) {
                return Value::Number(number);
            }
        }
    }
    if types.contains_type(PrimitiveType::Boolean) {
        match text.as_str() {
            "true" | "1" => return Value::Bool(true),
            "false" | "0" => return Value::Bool(false),
            _ => {}
        }
    }
    Value::String(text)
}

fn subtree_has_non_body_sources(schema: &Schema) -> bool {
    let node = &*schema.inner;
    node.sources.iter().any(|source| *source != Source::Body)
        || node
            .properties
            .iter()
            .any(|(_, property)| subtree_has_non_body_sources(property))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashMap;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Default)]
    struct FakeRequest {
        body: Option<Vec<u8>>,
        query: AHashMap<String, String>,
        params: AHashMap<String, String>,
        headers: AHashMap<String, String>,
    }

    impl RequestSource for FakeRequest {
        fn body(&self) -> Option<Vec<u8>> {
            self.body.clone()
        }
        fn query(&self, name: &str) -> Option<String> {
            self.query.get(name).cloned()
        }
        fn param(&self, name: &str) -> Option<String> {
            self.params.get(name).cloned()
        }
        fn header(&self, name: &str) -> Option<String> {
            self.headers.get(name).cloned()
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
        age: f64,
    }

    fn person_schema() -> &'static [u8] {
        br#"{
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "number", "in": ["query"]}
            },
            "required": ["name", "age"]
        }"#
    }

    #[test]
    fn body_and_query_bind_together() {
        let mut request = FakeRequest {
            body: Some(br#"{"name": "x"}"#.to_vec()),
            ..FakeRequest::default()
        };
        request.query.insert("age".to_string(), "42".to_string());
        let person: Person =
            unmarshal_and_validate_request(&request, person_schema()).unwrap();
        assert_eq!(
            person,
            Person {
                name: "x".to_string(),
                age: 42.0
            }
        );
    }

    #[test]
    fn missing_source_is_an_extraction_error() {
        let request = FakeRequest {
            body: Some(br#"{"name": "x"}"#.to_vec()),
            ..FakeRequest::default()
        };
        let result: Result<Person, _> =
            unmarshal_and_validate_request(&request, person_schema());
        assert!(matches!(
            result,
            Err(BindError::Extraction { ref field, .. }) if field == "age"
        ));
    }

    #[test]
    fn body_value_satisfies_a_non_body_source() {
        let request = FakeRequest {
            body: Some(br#"{"name": "x", "age": 30}"#.to_vec()),
            ..FakeRequest::default()
        };
        let person: Person =
            unmarshal_and_validate_request(&request, person_schema()).unwrap();
        assert_eq!(person.age, 30.0);
    }

    #[test]
    fn authorization_header_strips_the_scheme() {
        #[derive(Debug, Deserialize)]
        struct Authed {
            token: String,
        }
        let schema = br#"{
            "type": "object",
            "properties": {
                "token": {"type": "string", "in": ["header"], "field": "Authorization"}
            }
        }"#;
        let mut request = FakeRequest::default();
        request
            .headers
            .insert("Authorization".to_string(), "Bearer abc123".to_string());
        let authed: Authed = unmarshal_and_validate_request(&request, schema).unwrap();
        assert_eq!(authed.token, "abc123");
    }

    #[test]
    fn first_listed_source_wins() {
        #[derive(Debug, Deserialize)]
        struct Pick {
            id: i64,
        }
        let schema = br#"{
            "type": "object",
            "properties": {
                "id": {"type": "integer", "in": ["params", "query"]}
            }
        }"#;
        let mut request = FakeRequest::default();
        request.params.insert("id".to_string(), "7".to_string());
        request.query.insert("id".to_string(), "9".to_string());
        let picked: Pick = unmarshal_and_validate_request(&request, schema).unwrap();
        assert_eq!(picked.id, 7);
    }

    #[test]
    fn nested_objects_recurse() {
        #[derive(Debug, Deserialize)]
        struct Outer {
            meta: Meta,
        }
        #[derive(Debug, Deserialize)]
        struct Meta {
            trace: String,
        }
        let schema = br#"{
            "type": "object",
            "properties": {
                "meta": {
                    "type": "object",
                    "properties": {
                        "trace": {"type": "string", "in": ["header"], "field": "X-Trace"}
                    }
                }
            }
        }"#;
        let mut request = FakeRequest::default();
        request
            .headers
            .insert("X-Trace".to_string(), "trace-1".to_string());
        let outer: Outer = unmarshal_and_validate_request(&request, schema).unwrap();
        assert_eq!(outer.meta.trace, "trace-1");
    }

    #[test]
    fn boolean_coercion_from_query() {
        #[derive(Debug, Deserialize)]
        struct Flags {
            verbose: bool,
        }
        let schema = br#"{
            "type": "object",
            "properties": {
                "verbose": {"type": "boolean", "in": ["query"]}
            }
        }"#;
        let mut request = FakeRequest::default();
        request
            .query
            .insert("verbose".to_string(), "true".to_string());
        let flags: Flags = unmarshal_and_validate_request(&request, schema).unwrap();
        assert!(flags.verbose);
    }

    #[test]
    fn unparseable_body_starts_empty() {
        let mut request = FakeRequest {
            body: Some(b"not json".to_vec()),
            ..FakeRequest::default()
        };
        request.query.insert("age".to_string(), "42".to_string());
        let result: Result<Person, _> =
            unmarshal_and_validate_request(&request, person_schema());
        // `name` never arrives, so validation reports it
        assert!(matches!(result, Err(BindError::Validation(_))));
    }
}
