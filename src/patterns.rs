//! Process-wide pool of interned, ECMA-262-converted regular expressions.
//!
//! `pattern` and `patternProperties` keys are written against the ECMA 262
//! dialect; the converter rewrites the character classes that differ before
//! handing the result to `fancy-regex`. Compiled matchers are interned so
//! the same pattern text is compiled once per process, no matter how many
//! schemas use it.
use crate::error::CompileError;
use ahash::AHashMap;
use fancy_regex::Regex;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Captures;
use std::ops::Index;
use std::sync::Arc;

lazy_static::lazy_static! {
    static ref CONTROL_GROUPS_RE: regex::Regex =
        regex::Regex::new(r"\\c[A-Za-z]").expect("Is a valid regex");
}

static POOL: Lazy<RwLock<AHashMap<String, Arc<Regex>>>> =
    Lazy::new(|| RwLock::new(AHashMap::new()));

/// Fetch the interned matcher for `pattern`, compiling and converting it on
/// first use. Entries are write-once and never evicted.
pub(crate) fn intern(pattern: &str) -> Result<Arc<Regex>, CompileError> {
    if let Some(compiled) = POOL.read().get(pattern) {
        return Ok(Arc::clone(compiled));
    }
    let compiled = Arc::new(convert_regex(pattern).map_err(|_| CompileError::Pattern {
        pattern: pattern.to_string(),
    })?);
    POOL.write()
        .entry(pattern.to_string())
        .or_insert_with(|| Arc::clone(&compiled));
    Ok(compiled)
}

/// True when the interned matcher accepts `text`. Match failures from
/// pathological look-arounds count as non-matches.
pub(crate) fn is_match(matcher: &Regex, text: &str) -> bool {
    matcher.is_match(text).unwrap_or(false)
}

// ECMA 262 has differences
pub(crate) fn convert_regex(pattern: &str) -> Result<Regex, fancy_regex::Error> {
    // replace control chars
    let new_pattern = CONTROL_GROUPS_RE.replace_all(pattern, replace_control_group);
    let mut out = String::with_capacity(new_pattern.len());
    let mut chars = new_pattern.chars().peekable();
    // To convert character group we need to iterate over chars and in case of `\` take a look
    // at the next char to detect whether this group should be converted
    while let Some(current) = chars.next() {
        if current == '\\' {
            // Possible character group
            if let Some(next) = chars.next() {
                match next {
                    'd' => out.push_str("[0-9]"),
                    'D' => out.push_str("[^0-9]"),
                    'w' => out.push_str("[A-Za-z0-9_]"),
                    'W' => out.push_str("[^A-Za-z0-9_]"),
                    's' => {
                        out.push_str("[ \t\n\r\u{000b}\u{000c}\u{2003}\u{feff}\u{2029}\u{00a0}]")
                    }
                    'S' => {
                        out.push_str("[^ \t\n\r\u{000b}\u{000c}\u{2003}\u{feff}\u{2029}\u{00a0}]")
                    }
                    _ => {
                        // Nothing interesting, push as is
                        out.push(current);
                        out.push(next)
                    }
                }
            } else {
                // End of the string, push the last char.
                // Note that it is an incomplete escape sequence and will lead to an error on
                // the next step
                out.push(current);
            }
        } else {
            // Regular character
            out.push(current);
        }
    }
    Regex::new(&out)
}

fn replace_control_group(captures: &Captures) -> String {
    // There will be no overflow, because the minimum value is 65 (char 'A')
    ((captures
        .index(0)
        .trim_start_matches(r"\c")
        .chars()
        .next()
        .expect("This is always present because of the regex rule. It has [A-Za-z] next")
        .to_ascii_uppercase() as u8
        - 64) as char)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r"^[\w\-\.\+]+$", "CC-BY-4.0", true)]
    #[test_case(r"^[\w\-\.\+]+$", "CC-BY-!", false)]
    #[test_case(r"^\W+$", "1_0", false)]
    #[test_case(r"\\w", r"\w", true)]
    fn regex_matches(pattern: &str, text: &str, is_matching: bool) {
        let compiled = convert_regex(pattern).expect("A valid regex");
        assert_eq!(compiled.is_match(text).unwrap(), is_matching);
    }

    #[test_case(r"\"; "backslash")]
    #[test_case(r"["; "open_bracket")]
    fn invalid_patterns(pattern: &str) {
        assert!(convert_regex(pattern).is_err())
    }

    #[test]
    fn interned_matchers_are_shared() {
        let first = intern("^abc$").unwrap();
        let second = intern("^abc$").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
