//! `contentEncoding` / `contentMediaType` checks and converters.
use crate::parsing;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde_json::Value;

pub(crate) type ContentEncodingCheckType = fn(&str) -> bool;
pub(crate) type ContentEncodingConverterType = fn(&str) -> Option<String>;
pub(crate) type ContentMediaTypeCheckType = fn(&str) -> bool;

pub(crate) fn is_base64(instance_string: &str) -> bool {
    base64::decode(instance_string).is_ok()
}

pub(crate) fn from_base64(instance_string: &str) -> Option<String> {
    match base64::decode(instance_string) {
        Ok(value) => String::from_utf8(value).ok(),
        Err(_) => None,
    }
}

pub(crate) fn is_json(instance_string: &str) -> bool {
    parsing::parse_slice(instance_string.as_bytes()).is_ok()
}

pub(crate) fn parse_json(instance_string: &str) -> Option<Value> {
    parsing::parse_slice(instance_string.as_bytes()).ok()
}

pub(crate) static CONTENT_ENCODING_CHECKS_AND_CONVERTERS: Lazy<
    AHashMap<&'static str, (ContentEncodingCheckType, ContentEncodingConverterType)>,
> = Lazy::new(|| {
    let mut map: AHashMap<&'static str, (ContentEncodingCheckType, ContentEncodingConverterType)> =
        AHashMap::with_capacity(1);
    map.insert("base64", (is_base64, from_base64));
    map
});

pub(crate) static CONTENT_MEDIA_TYPE_CHECKS: Lazy<AHashMap<&'static str, ContentMediaTypeCheckType>> =
    Lazy::new(|| {
        let mut map: AHashMap<&'static str, ContentMediaTypeCheckType> =
            AHashMap::with_capacity(1);
        map.insert("application/json", is_json);
        map
    });

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base64_roundtrip() {
        assert!(is_base64("eyJhIjogMX0="));
        assert_eq!(from_base64("eyJhIjogMX0=").unwrap(), "{\"a\": 1}");
        assert!(!is_base64("not base64!"));
    }

    #[test]
    fn json_media_type() {
        assert!(is_json("{\"a\": 1}"));
        assert!(!is_json("{"));
        assert_eq!(parse_json("{\"a\": 1}").unwrap(), json!({"a": 1}));
    }
}
