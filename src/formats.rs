//! The process-wide `format` validator registry.
//!
//! Built-ins cover the formats the dialect names; more can be registered at
//! runtime. Registration is additive and meant to happen at startup; tests
//! can restore the built-in set with [`reset_formats`].
use ahash::AHashMap;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// A predicate deciding whether a string conforms to a named format.
pub type FormatValidator = Arc<dyn Fn(&str) -> bool + Send + Sync>;

lazy_static::lazy_static! {
    static ref DATE_RE: Regex =
        Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}\z").expect("Is a valid regex");
    static ref JSON_POINTER_RE: Regex =
        Regex::new(r"^(/(([^/~])|(~[01]))*)*\z").expect("Is a valid regex");
    static ref RELATIVE_JSON_POINTER_RE: Regex =
        Regex::new(r"^(?:0|[1-9][0-9]*)(?:#|(?:/(?:[^~/]|~0|~1)*)*)\z").expect("Is a valid regex");
    static ref TIME_RE: Regex =
        Regex::new(
        r"^([01][0-9]|2[0-3]):([0-5][0-9]):([0-5][0-9])(\.[0-9]+)?(([Zz])|([+|\-]([01][0-9]|2[0-3]):[0-5][0-9]))\z",
    ).expect("Is a valid regex");
    static ref URI_REFERENCE_RE: Regex =
        Regex::new(r"^(\w+:(/?/?))?[^#\\\s]*(#[^\\\s]*)?\z").expect("Is a valid regex");
    static ref UUID_RE: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\z"
    ).expect("Is a valid regex");
}

fn is_date(item: &str) -> bool {
    if NaiveDate::parse_from_str(item, "%Y-%m-%d").is_ok() {
        // Padding with zeroes is ignored by the underlying parser, so the
        // shape is re-checked with a regex
        DATE_RE.is_match(item)
    } else {
        false
    }
}

fn is_date_time(item: &str) -> bool {
    DateTime::parse_from_rfc3339(item).is_ok()
}

fn is_time(item: &str) -> bool {
    TIME_RE.is_match(item)
}

fn is_duration(item: &str) -> bool {
    // ISO 8601 duration: P[nY][nM][nD][T[nH][nM][nS]] or PnW
    let mut chars = item.chars();
    if chars.next() != Some('P') {
        return false;
    }
    let rest: &str = chars.as_str();
    if rest.is_empty() {
        return false;
    }
    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };
    if matches!(time_part, Some("")) {
        return false;
    }
    let mut saw_designator = false;
    let mut check = |part: &str, designators: &[char]| -> bool {
        let mut number_len = 0;
        let mut last_index = 0;
        for character in part.chars() {
            if character.is_ascii_digit() {
                number_len += 1;
            } else {
                let position = match designators[last_index..]
                    .iter()
                    .position(|designator| *designator == character)
                {
                    Some(position) => position,
                    None => return false,
                };
                if number_len == 0 {
                    return false;
                }
                last_index += position + 1;
                number_len = 0;
                saw_designator = true;
            }
        }
        number_len == 0
    };
    if !check(date_part, &['Y', 'M', 'W', 'D']) {
        return false;
    }
    if let Some(time) = time_part {
        if !check(time, &['H', 'M', 'S']) {
            return false;
        }
    }
    saw_designator
}

fn is_email(item: &str) -> bool {
    item.contains('@')
}

fn is_hostname(item: &str) -> bool {
    !(item.ends_with('-')
        || item.starts_with('-')
        || item.is_empty()
        || item.chars().count() > 255
        || item
            .chars()
            .any(|c| !(c.is_alphanumeric() || c == '-' || c == '.'))
        || item.split('.').any(|part| part.chars().count() > 63))
}

fn is_ipv4(item: &str) -> bool {
    if item.split('.').any(|octet| octet.len() > 1 && octet.starts_with('0')) {
        return false;
    }
    match IpAddr::from_str(item) {
        Ok(address) => address.is_ipv4(),
        Err(_) => false,
    }
}

fn is_ipv6(item: &str) -> bool {
    match IpAddr::from_str(item) {
        Ok(address) => address.is_ipv6(),
        Err(_) => false,
    }
}

fn is_uri(item: &str) -> bool {
    Url::from_str(item).is_ok()
}

fn is_uri_reference(item: &str) -> bool {
    URI_REFERENCE_RE.is_match(item)
}

fn is_uuid(item: &str) -> bool {
    UUID_RE.is_match(item)
}

fn is_json_pointer(item: &str) -> bool {
    JSON_POINTER_RE.is_match(item)
}

fn is_relative_json_pointer(item: &str) -> bool {
    RELATIVE_JSON_POINTER_RE.is_match(item)
}

fn is_regex(item: &str) -> bool {
    crate::patterns::convert_regex(item).is_ok()
}

fn built_ins() -> AHashMap<String, FormatValidator> {
    let mut map: AHashMap<String, FormatValidator> = AHashMap::with_capacity(16);
    let entries: &[(&str, fn(&str) -> bool)] = &[
        ("date", is_date),
        ("date-time", is_date_time),
        ("duration", is_duration),
        ("email", is_email),
        ("hostname", is_hostname),
        ("ipv4", is_ipv4),
        ("ipv6", is_ipv6),
        ("json-pointer", is_json_pointer),
        ("regex", is_regex),
        ("relative-json-pointer", is_relative_json_pointer),
        ("time", is_time),
        ("uri", is_uri),
        ("uri-reference", is_uri_reference),
        ("uuid", is_uuid),
    ];
    for (name, check) in entries {
        let check = *check;
        map.insert((*name).to_string(), Arc::new(check));
    }
    map
}

static REGISTRY: Lazy<RwLock<AHashMap<String, FormatValidator>>> =
    Lazy::new(|| RwLock::new(built_ins()));

/// Register an additional `format` validator under `name`. Later
/// registrations replace earlier ones of the same name.
pub fn register_format(
    name: impl Into<String>,
    check: impl Fn(&str) -> bool + Send + Sync + 'static,
) {
    REGISTRY.write().insert(name.into(), Arc::new(check));
}

/// Restore the built-in format validators, removing runtime registrations.
pub fn reset_formats() {
    *REGISTRY.write() = built_ins();
}

pub(crate) fn lookup(name: &str) -> Option<FormatValidator> {
    REGISTRY.read().get(name).map(Arc::clone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("date", "1984-02-29", true)]
    #[test_case("date", "1984-2-29", false)]
    #[test_case("date-time", "2018-11-13T20:20:39+00:00", true)]
    #[test_case("date-time", "not a date", false)]
    #[test_case("duration", "P3DT12H", true)]
    #[test_case("duration", "P", false)]
    #[test_case("duration", "PT", false)]
    #[test_case("duration", "P1W", true)]
    #[test_case("email", "joe@example.com", true)]
    #[test_case("email", "joe", false)]
    #[test_case("hostname", "example.com", true)]
    #[test_case("hostname", "-bad.example", false)]
    #[test_case("ipv4", "192.168.1.1", true)]
    #[test_case("ipv4", "192.168.01.1", false)]
    #[test_case("ipv6", "::1", true)]
    #[test_case("ipv6", "12345::", false)]
    #[test_case("json-pointer", "/a/~0b", true)]
    #[test_case("json-pointer", "a", false)]
    #[test_case("relative-json-pointer", "1/a", true)]
    #[test_case("relative-json-pointer", "/a", false)]
    #[test_case("uri", "https://example.com/x", true)]
    #[test_case("uri", "not a uri", false)]
    #[test_case("uri-reference", "/relative/path#frag", true)]
    #[test_case("uuid", "2eb8aa08-aa98-11ea-b4aa-73b441d16380", true)]
    #[test_case("uuid", "2eb8aa08-aa98-11ea-b4aa", false)]
    fn built_in_formats(format: &str, item: &str, expected: bool) {
        let check = lookup(format).expect("A built-in format");
        assert_eq!(check(item), expected);
    }

    #[test]
    fn register_and_reset() {
        register_format("even-length", |item| item.len() % 2 == 0);
        assert!(lookup("even-length").is_some());
        reset_formats();
        assert!(lookup("even-length").is_none());
        assert!(lookup("uuid").is_some());
    }
}
